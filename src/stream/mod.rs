//! `std::io` adapters over the slice-level codec.
//!
//! A Tamp stream is self-terminating only in the sense that its trailing
//! padding decodes to nothing, so these adapters simply run until their
//! reader reports end of input.
//!
//! Use [`copy_compress`] / [`copy_decompress`] to pump a whole reader into a
//! writer (optionally with a progress callback that can cancel the run), or
//! wrap a compressed source in [`TampReader`] to get a decompressing
//! `Read`/`BufRead`.

mod compress;
mod decompress;

use std::io;

use thiserror::Error;

use crate::compress::CompressError;
use crate::decompress::DecompressError;
use crate::header::ConfigError;

pub use compress::*;
pub use decompress::*;

/// Errors when pumping a stream through the codec.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("error reading from the input you gave me")]
    ReadError(io::Error),
    #[error("error writing to the output you gave me")]
    WriteError(#[from] io::Error),
    #[error("the stream configuration was rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("compression failed: {0}")]
    Compress(#[from] CompressError),
    #[error("the compressed data is corrupt: {0}")]
    Decode(#[from] DecompressError),
}
type Error = StreamError; // do it this way for better docs

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, e)
    }
}
