//! Reader-side decompression: a one-shot pump and a `Read` adapter.

use byteorder::ReadBytesExt;
use std::cmp;
use std::io::{self, BufRead, Read, Write};

use fehler::throws;

use crate::decompress::Decompressor;
use crate::header::Config;
use crate::Flow;

use super::Error;

const CHUNK_SIZE: usize = 4 * 1024;

/// Decompress everything `reader` yields into `writer`.
///
/// The stream header is read from `reader` first. Returns `(compressed bytes
/// read, uncompressed bytes written)`. Streams that call for a custom
/// dictionary are rejected; decode those through
/// [`Decompressor::with_window`] directly.
#[throws]
pub fn copy_decompress<R: Read, W: Write>(mut reader: R, mut writer: W) -> (u64, u64) {
    let header = reader.read_u8().map_err(Error::ReadError)?;
    let config = Config::from_header_byte(header)?;
    let mut decompressor = Decompressor::new(&config)?;

    let mut in_buf = [0u8; CHUNK_SIZE];
    let mut out_buf = [0u8; CHUNK_SIZE];
    let mut bytes_in: u64 = 1;
    let mut bytes_out: u64 = 0;

    loop {
        let got = reader.read(&mut in_buf).map_err(Error::ReadError)?;
        if got == 0 {
            break;
        }
        bytes_in += got as u64;

        let mut fed = 0;
        loop {
            let (flow, consumed, written) =
                decompressor.decompress(&mut out_buf, &in_buf[fed..got])?;
            fed += consumed;
            writer.write_all(&out_buf[..written])?;
            bytes_out += written as u64;
            if flow == Flow::InputExhausted {
                break;
            }
        }
    }

    (bytes_in, bytes_out)
}

/// Wrapper around [`Decompressor`] that implements `Read` and `BufRead`.
///
/// Compressed bytes are pulled from the inner reader as needed; decompressed
/// bytes are served out of an internal block buffer.
pub struct TampReader<R: Read> {
    reader: R,
    decompressor: Decompressor,
    in_buf: [u8; CHUNK_SIZE],
    in_pos: usize,
    in_len: usize,
    out_buf: [u8; CHUNK_SIZE],
    out_taken: usize,
    out_len: usize,
    input_done: bool,
}

impl<R: Read> TampReader<R> {
    /// Read the stream header from `reader` and set up decompression.
    ///
    /// Like [`copy_decompress`], custom-dictionary streams are rejected.
    #[throws]
    pub fn new(mut reader: R) -> Self {
        let header = reader.read_u8().map_err(Error::ReadError)?;
        let config = Config::from_header_byte(header)?;
        TampReader {
            reader,
            decompressor: Decompressor::new(&config)?,
            in_buf: [0; CHUNK_SIZE],
            in_pos: 0,
            in_len: 0,
            out_buf: [0; CHUNK_SIZE],
            out_taken: 0,
            out_len: 0,
            input_done: false,
        }
    }

    /// The configuration the stream header declared.
    pub fn config(&self) -> &Config {
        self.decompressor.config()
    }
}

impl<R: Read> BufRead for TampReader<R> {
    #[throws(io::Error)]
    fn fill_buf(&mut self) -> &[u8] {
        while self.out_taken == self.out_len {
            if self.in_pos == self.in_len && !self.input_done {
                self.in_len = self.reader.read(&mut self.in_buf)?;
                self.in_pos = 0;
                if self.in_len == 0 {
                    self.input_done = true;
                }
            }

            // Run the decoder even with no input left: a pattern parked on a
            // full output buffer still has bytes to hand out.
            let (flow, consumed, written) = self
                .decompressor
                .decompress(&mut self.out_buf, &self.in_buf[self.in_pos..self.in_len])
                .map_err(Error::Decode)?;
            self.in_pos += consumed;
            self.out_taken = 0;
            self.out_len = written;

            if written == 0 && flow == Flow::InputExhausted && self.input_done {
                break;
            }
        }
        &self.out_buf[self.out_taken..self.out_len]
    }

    fn consume(&mut self, amt: usize) {
        self.out_taken = cmp::min(self.out_taken + amt, self.out_len);
    }
}

impl<R: Read> Read for TampReader<R> {
    #[throws(io::Error)]
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let available = self.fill_buf()?;
        let bytes_to_take = cmp::min(available.len(), buf.len());
        buf[..bytes_to_take].copy_from_slice(&available[..bytes_to_take]);
        self.consume(bytes_to_take);
        bytes_to_take
    }
}
