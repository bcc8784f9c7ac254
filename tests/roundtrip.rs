//! Round-trip coverage across configurations, chunkings and dictionaries.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tamp::{
    compress_with, decompress, decompress_with_dictionary, Compressor, Config, Flow,
};

/// Drive a compressor with fixed-size input chunks and a small output buffer.
fn compress_chunked(config: &Config, data: &[u8], chunk: usize) -> Vec<u8> {
    let mut compressor = Compressor::new(config).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 96];

    for piece in data.chunks(chunk) {
        let mut fed = 0;
        while fed < piece.len() {
            let (_, consumed, written) = compressor.compress(&mut buf, &piece[fed..]).unwrap();
            fed += consumed;
            out.extend_from_slice(&buf[..written]);
        }
    }
    loop {
        let (flow, written) = compressor.flush(&mut buf, false).unwrap();
        out.extend_from_slice(&buf[..written]);
        if flow == Flow::Done {
            break;
        }
    }
    out
}

#[test]
fn chunking_never_changes_the_stream() {
    let config = Config::default();
    let data = b"how the input arrives must not leak into the output; \
                 how the input arrives must not leak into the output."
        .to_vec();
    let reference = compress_with(&config, &data).unwrap();

    for &chunk in &[1, 2, 3, 5, 7, 16, 33, 64, 1024] {
        assert_eq!(
            compress_chunked(&config, &data, chunk),
            reference,
            "chunk size {}",
            chunk
        );
    }
}

#[test]
fn random_streams_round_trip_across_window_sizes() {
    let mut rng = StdRng::seed_from_u64(0x7a3b_9d42);
    for window_bits in 8..=15 {
        let config = Config::new().window_bits(window_bits).unwrap();
        for round in 0..4 {
            let len = rng.gen_range(0, 1500);
            let mut data = vec![0u8; len];
            match round % 3 {
                // raw noise: mostly literals
                0 => rng.fill(&mut data[..]),
                // tiny alphabet: dense with matches
                1 => {
                    for byte in &mut data {
                        *byte = rng.gen_range(b'a', b'e');
                    }
                }
                // zeroes: one long run
                _ => {}
            }

            let compressed = compress_with(&config, &data).unwrap();
            assert_eq!(
                decompress(&compressed).unwrap(),
                data,
                "window_bits {} round {}",
                window_bits,
                round
            );
        }
    }
}

#[test]
fn narrow_literal_modes_round_trip() {
    let mut rng = StdRng::seed_from_u64(91);
    for literal_bits in 5..=7 {
        let config = Config::new().literal_bits(literal_bits).unwrap();
        let mask = ((1u16 << literal_bits) - 1) as u8;
        let mut data = vec![0u8; 900];
        for byte in &mut data {
            *byte = rng.gen::<u8>() & mask;
        }

        let compressed = compress_with(&config, &data).unwrap();
        assert_eq!(
            decompress(&compressed).unwrap(),
            data,
            "literal_bits {}",
            literal_bits
        );
    }
}

#[test]
fn random_flush_points_round_trip() {
    let mut rng = StdRng::seed_from_u64(0xdead_bee5);
    let config = Config::default();

    for _ in 0..8 {
        let mut compressor = Compressor::new(&config).unwrap();
        let mut stream = Vec::new();
        let mut expected = Vec::new();
        let mut buf = [0u8; 128];

        let segments = rng.gen_range(1, 5);
        for _ in 0..segments {
            let len = rng.gen_range(0, 400);
            let mut segment = vec![0u8; len];
            for byte in &mut segment {
                *byte = rng.gen_range(b'0', b'8');
            }
            expected.extend_from_slice(&segment);

            let mut fed = 0;
            while fed < segment.len() {
                let (_, consumed, written) =
                    compressor.compress(&mut buf, &segment[fed..]).unwrap();
                fed += consumed;
                stream.extend_from_slice(&buf[..written]);
            }
            loop {
                let (flow, written) = compressor.flush(&mut buf, true).unwrap();
                stream.extend_from_slice(&buf[..written]);
                if flow == Flow::Done {
                    break;
                }
            }
        }
        loop {
            let (flow, written) = compressor.flush(&mut buf, false).unwrap();
            stream.extend_from_slice(&buf[..written]);
            if flow == Flow::Done {
                break;
            }
        }

        assert_eq!(decompress(&stream).unwrap(), expected);
    }
}

#[test]
fn custom_dictionary_round_trips() {
    let config = Config::default().custom_dictionary(true);
    let mut dictionary = vec![0u8; config.window_size()];
    for (slot, byte) in dictionary
        .iter_mut()
        .zip(b"sensor reading nominal; ".iter().cycle())
    {
        *slot = *byte;
    }

    let data = b"sensor reading nominal; sensor reading erratic; sensor reading nominal; ";
    let mut compressor = Compressor::with_window(&config, dictionary.clone()).unwrap();
    let mut stream = Vec::new();
    let mut buf = [0u8; 128];
    let (_, consumed, written) = compressor.compress(&mut buf, data).unwrap();
    assert_eq!(consumed, data.len());
    stream.extend_from_slice(&buf[..written]);
    loop {
        let (flow, written) = compressor.flush(&mut buf, false).unwrap();
        stream.extend_from_slice(&buf[..written]);
        if flow == Flow::Done {
            break;
        }
    }

    assert_eq!(
        decompress_with_dictionary(&stream, &dictionary).unwrap(),
        data.to_vec()
    );

    // A dictionary full of the payload's phrases beats the stock fill.
    let baseline = tamp::compress(data);
    assert!(stream.len() < baseline.len());
}

#[test]
fn dictionary_of_the_wrong_size_is_rejected() {
    let config = Config::default().custom_dictionary(true);
    let compressed = {
        let mut dictionary = vec![b'x'; config.window_size()];
        dictionary[0] = b'y';
        let mut compressor = Compressor::with_window(&config, dictionary).unwrap();
        let mut buf = [0u8; 64];
        let (_, written) = compressor.flush(&mut buf, false).unwrap();
        buf[..written].to_vec()
    };

    assert!(decompress_with_dictionary(&compressed, &[b'x'; 100]).is_err());
}

#[test]
fn empty_and_tiny_inputs_round_trip_in_every_config() {
    for window_bits in 8..=15 {
        for literal_bits in 5..=8 {
            let config = Config::new()
                .window_bits(window_bits)
                .unwrap()
                .literal_bits(literal_bits)
                .unwrap();
            for data in &[&b""[..], &b"\x01"[..], &b"\x01\x02"[..], &b"\x07\x07\x07"[..]] {
                let compressed = compress_with(&config, data).unwrap();
                assert_eq!(
                    decompress(&compressed).unwrap(),
                    data.to_vec(),
                    "w={} l={} data={:?}",
                    window_bits,
                    literal_bits,
                    data
                );
            }
        }
    }
}
