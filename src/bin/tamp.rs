//! Thin command-line front-end over the streaming pumps.

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use getopts::Options;

use tamp::stream::{copy_compress, copy_decompress, StreamError};
use tamp::Config;

fn print_usage(program: &str, opts: &Options) {
    let brief = format!(
        "Usage: {} compress|decompress [options] [FILE]\n\n\
         Reads FILE (or stdin) and writes the result to stdout unless -o is given.",
        program
    );
    print!("{}", opts.usage(&brief));
}

fn run(command: &str, config: &Config, input: &mut dyn Read, output: &mut dyn Write) -> Result<(u64, u64), StreamError> {
    match command {
        "compress" => copy_compress(config, input, output),
        "decompress" => copy_decompress(input, output),
        _ => unreachable!("command validated by main"),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];

    let mut opts = Options::new();
    opts.optopt("w", "window", "window size in bits, 8-15 (default 10)", "BITS");
    opts.optopt("l", "literal", "literal size in bits, 5-8 (default 8)", "BITS");
    opts.optopt("o", "output", "write to FILE instead of stdout", "FILE");
    opts.optflag("h", "help", "print this help");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{}: {}", program, fail);
            process::exit(2);
        }
    };

    if matches.opt_present("h") {
        print_usage(program, &opts);
        return;
    }

    let command = match matches.free.get(0).map(String::as_str) {
        Some(command) if command == "compress" || command == "decompress" => command,
        _ => {
            print_usage(program, &opts);
            process::exit(2);
        }
    };

    let mut config = Config::default();
    if let Some(bits) = matches.opt_str("w") {
        config = match bits.parse().ok().and_then(|bits| config.window_bits(bits).ok()) {
            Some(config) => config,
            None => {
                eprintln!("{}: window size must be 8-15 bits, got {:?}", program, bits);
                process::exit(2);
            }
        };
    }
    if let Some(bits) = matches.opt_str("l") {
        config = match bits.parse().ok().and_then(|bits| config.literal_bits(bits).ok()) {
            Some(config) => config,
            None => {
                eprintln!("{}: literal size must be 5-8 bits, got {:?}", program, bits);
                process::exit(2);
            }
        };
    }

    let mut input: Box<dyn Read> = match matches.free.get(1) {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                eprintln!("{}: {}: {}", program, path, e);
                process::exit(1);
            }
        },
        None => Box::new(io::stdin()),
    };

    let mut output: Box<dyn Write> = match matches.opt_str("o") {
        Some(path) => match File::create(&path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                eprintln!("{}: {}: {}", program, path, e);
                process::exit(1);
            }
        },
        None => Box::new(io::stdout()),
    };

    match run(command, &config, &mut input, &mut output) {
        Ok(_) => {
            if let Err(e) = output.flush() {
                eprintln!("{}: {}", program, e);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}: {}: {}", program, command, e);
            process::exit(1);
        }
    }
}
