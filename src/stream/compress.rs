//! Reader-to-writer compression pumps.

use std::io::{Read, Write};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use fehler::throws;

use crate::compress::Compressor;
use crate::header::Config;
use crate::Flow;

use super::Error;

const CHUNK_SIZE: usize = 4 * 1024;

/// A snapshot handed to the progress callback between encode steps.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    /// Uncompressed bytes accepted so far.
    pub bytes_in: u64,
    /// Compressed bytes handed to the writer so far.
    pub bytes_out: u64,
    /// Wall-clock time since the pump started.
    pub elapsed: Duration,
}

/// Whether a pump ran to completion or was cancelled by its callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    Finished,
    Cancelled,
}

/// Compress everything `reader` yields into `writer`.
///
/// Returns `(uncompressed bytes read, compressed bytes written)`. The stream
/// is finalized (flushed without a flush marker) when the reader reports end
/// of input.
#[throws]
pub fn copy_compress<R: Read, W: Write>(config: &Config, reader: R, writer: W) -> (u64, u64) {
    let (_, bytes_in, bytes_out) =
        copy_compress_with(config, reader, writer, |_| ControlFlow::Continue(()))?;
    (bytes_in, bytes_out)
}

/// Like [`copy_compress`], invoking `on_poll` between encode steps.
///
/// Returning [`ControlFlow::Break`] from the callback stops the pump cleanly:
/// the stream is left unfinalized and [`StreamEnd::Cancelled`] is returned
/// with the counts so far.
#[throws]
pub fn copy_compress_with<R, W, F>(
    config: &Config,
    mut reader: R,
    mut writer: W,
    mut on_poll: F,
) -> (StreamEnd, u64, u64)
where
    R: Read,
    W: Write,
    F: FnMut(Progress) -> ControlFlow<()>,
{
    let started = Instant::now();
    let mut compressor = Compressor::new(config)?;
    let mut in_buf = [0u8; CHUNK_SIZE];
    let mut out_buf = [0u8; CHUNK_SIZE];
    let mut bytes_in: u64 = 0;
    let mut bytes_out: u64 = 0;

    loop {
        let got = reader.read(&mut in_buf).map_err(Error::ReadError)?;
        if got == 0 {
            break;
        }
        bytes_in += got as u64;

        let mut fed = 0;
        while fed < got {
            let (_, consumed, written) = compressor.compress(&mut out_buf, &in_buf[fed..got])?;
            fed += consumed;
            writer.write_all(&out_buf[..written])?;
            bytes_out += written as u64;

            let progress = Progress {
                bytes_in: bytes_in - (got - fed) as u64,
                bytes_out,
                elapsed: started.elapsed(),
            };
            if let ControlFlow::Break(()) = on_poll(progress) {
                return (StreamEnd::Cancelled, bytes_in, bytes_out);
            }
        }
    }

    loop {
        let (flow, written) = compressor.flush(&mut out_buf, false)?;
        writer.write_all(&out_buf[..written])?;
        bytes_out += written as u64;
        if flow == Flow::Done {
            break;
        }
    }

    (StreamEnd::Finished, bytes_in, bytes_out)
}
