//! The compression half of the codec.
//!
//! The compressor keeps a 16-byte lookahead ring. Each encode step looks at
//! the staged bytes, scans the window for the longest earlier occurrence and
//! emits either one literal or one pattern token, then feeds the covered
//! bytes into the window exactly as the decompressor will. Fixed memory,
//! no allocation: window storage is caller-provided (or boxed by [`Compressor::new`]).
//!
//! Reproducibility matters more than ratio here: for a given configuration,
//! the token choice is fully determined by the input, so independent
//! implementations can be compared byte for byte. The window scan picks the
//! lowest index among equal-length matches and only a strictly longer match
//! displaces the current best.

use fehler::{throw, throws};
use thiserror::Error;

use crate::bits::BitWriter;
use crate::dict::initialize_dictionary;
use crate::header::{Config, ConfigError};
use crate::{Flow, FLUSH_CODE, LENGTH_CODES, STAGING_SIZE};

/// Errors when compressing a Tamp stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressError {
    #[error("byte 0x{byte:02x} does not fit in {literal_bits}-bit literals")]
    ExcessBits { byte: u8, literal_bits: u8 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
type Error = CompressError; // do it this way for better docs

/// A streaming Tamp compressor.
///
/// `W` is the window storage, any `[u8]`-backed buffer of exactly
/// `config.window_size()` bytes; [`Compressor::new`] boxes one for you.
///
/// The low-level rhythm is [`sink`](Self::sink) bytes in, then
/// [`poll`](Self::poll) tokens out while [`full`](Self::full); most callers
/// want [`compress`](Self::compress), which interleaves the two, followed by
/// one [`flush`](Self::flush) at the end of the stream.
pub struct Compressor<W = Box<[u8]>> {
    config: Config,
    min_pattern_size: usize,
    max_pattern_size: usize,
    window: W,
    window_pos: usize,
    staging: [u8; STAGING_SIZE],
    input_pos: usize,
    input_size: usize,
    bits: BitWriter,
    flush_queued: bool,
}

impl Compressor {
    /// Allocate window storage and set up a compressor.
    ///
    /// Fails on out-of-range parameters, or if the configuration calls for a
    /// custom dictionary (use [`Compressor::with_window`] to supply one).
    #[throws(ConfigError)]
    pub fn new(config: &Config) -> Self {
        if config.use_custom_dictionary {
            throw!(ConfigError::MissingDictionary);
        }
        config.validate()?;
        let window = vec![0u8; config.window_size()].into_boxed_slice();
        Self::with_window(config, window)?
    }
}

impl<W: AsRef<[u8]> + AsMut<[u8]>> Compressor<W> {
    /// Set up a compressor over caller-provided window storage.
    ///
    /// `window` must hold exactly `config.window_size()` bytes. Under
    /// `use_custom_dictionary` its current contents become the shared
    /// dictionary; otherwise it is overwritten with the deterministic fill.
    /// The stream header is queued immediately, so the first poll or flush
    /// emits it.
    #[throws(ConfigError)]
    pub fn with_window(config: &Config, mut window: W) -> Self {
        config.validate()?;
        if window.as_ref().len() != config.window_size() {
            throw!(ConfigError::WindowStorage {
                expected: config.window_size(),
                actual: window.as_ref().len(),
            });
        }
        if !config.use_custom_dictionary {
            initialize_dictionary(window.as_mut());
        }

        let mut bits = BitWriter::new();
        bits.push(u32::from(config.to_header_byte()), 8);

        Compressor {
            config: *config,
            min_pattern_size: config.min_pattern_size(),
            max_pattern_size: config.max_pattern_size(),
            window,
            window_pos: 0,
            staging: [0; STAGING_SIZE],
            input_pos: 0,
            input_size: 0,
            bits,
            flush_queued: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Copy bytes into the lookahead ring, as many as currently fit, and
    /// return how many were taken. Never fails and never produces output.
    pub fn sink(&mut self, input: &[u8]) -> usize {
        let take = input.len().min(STAGING_SIZE - self.input_size);
        for &byte in &input[..take] {
            self.staging[(self.input_pos + self.input_size) % STAGING_SIZE] = byte;
            self.input_size += 1;
        }
        take
    }

    /// True when the lookahead ring holds its full 16 bytes.
    pub fn full(&self) -> bool {
        self.input_size == STAGING_SIZE
    }

    /// Perform at most one encode step.
    ///
    /// Drains previously queued bits first; if `out` cannot even take those,
    /// returns [`Flow::OutputFull`] without encoding anything. Otherwise one
    /// token is emitted and as much of it as fits is drained, with
    /// `Flow::OutputFull` signalling that queued bits remain.
    #[throws]
    pub fn poll(&mut self, out: &mut [u8]) -> (Flow, usize) {
        let mut written = 0;
        if !self.drain(out, &mut written) {
            return (Flow::OutputFull, written);
        }
        if self.input_size == 0 {
            return (Flow::Done, written);
        }

        let (match_index, match_size) = self.select_match();
        if match_size < self.min_pattern_size {
            let byte = self.staged(0);
            if u32::from(byte) >> self.config.literal_bits != 0 {
                throw!(Error::ExcessBits {
                    byte,
                    literal_bits: self.config.literal_bits,
                });
            }
            let flag = 1u32 << self.config.literal_bits;
            self.bits.push(flag | u32::from(byte), self.config.literal_bits + 1);
            self.absorb(1);
        } else {
            let (code, code_bits) = LENGTH_CODES[match_size - self.min_pattern_size];
            self.bits.push(code, code_bits);
            self.bits.push(match_index as u32, self.config.window_bits);
            self.absorb(match_size);
        }

        if self.drain(out, &mut written) {
            (Flow::Done, written)
        } else {
            (Flow::OutputFull, written)
        }
    }

    /// Interleave [`sink`](Self::sink) and [`poll`](Self::poll) over whole
    /// buffers. Returns the flow status plus `(input consumed, output written)`.
    ///
    /// Tokens are only ever decided while the lookahead ring is full, so how
    /// the input is chunked across calls cannot influence the emitted
    /// stream; leftovers below a full ring wait for more input or for
    /// [`flush`](Self::flush).
    #[throws]
    pub fn compress(&mut self, out: &mut [u8], input: &[u8]) -> (Flow, usize, usize) {
        let mut consumed = 0;
        let mut written = 0;
        while consumed < input.len() {
            consumed += self.sink(&input[consumed..]);
            while self.full() {
                let (flow, n) = self.poll(&mut out[written..])?;
                written += n;
                if flow == Flow::OutputFull {
                    return (Flow::OutputFull, consumed, written);
                }
            }
        }
        (Flow::Done, consumed, written)
    }

    /// Encode everything still staged and byte-align the stream.
    ///
    /// With `write_token` set, a flush marker is emitted before the padding
    /// whenever the stream is mid-byte, so the stream stays continuable:
    /// later tokens decode cleanly after it and the window carries over.
    /// Without it the stream is simply finalized. On [`Flow::OutputFull`]
    /// call again with fresh space; the marker is not queued twice.
    #[throws]
    pub fn flush(&mut self, out: &mut [u8], write_token: bool) -> (Flow, usize) {
        let mut written = 0;
        while self.input_size > 0 {
            let (flow, n) = self.poll(&mut out[written..])?;
            written += n;
            if flow == Flow::OutputFull {
                return (Flow::OutputFull, written);
            }
        }

        if write_token && self.bits.pending() > 0 && !self.flush_queued {
            self.bits.push(FLUSH_CODE.0, FLUSH_CODE.1);
            self.flush_queued = true;
        }
        self.bits.pad_to_byte();

        if self.drain(out, &mut written) {
            self.flush_queued = false;
            (Flow::Done, written)
        } else {
            (Flow::OutputFull, written)
        }
    }

    /// Move queued whole bytes into `out[*written..]`; true when fewer than
    /// 8 bits remain queued.
    fn drain(&mut self, out: &mut [u8], written: &mut usize) -> bool {
        while *written < out.len() {
            match self.bits.pop_byte() {
                Some(byte) => {
                    out[*written] = byte;
                    *written += 1;
                }
                None => return true,
            }
        }
        self.bits.pending() < 8
    }

    fn staged(&self, offset: usize) -> u8 {
        self.staging[(self.input_pos + offset) % STAGING_SIZE]
    }

    /// Feed `count` bytes of lookahead into the window, mirroring what the
    /// decompressor will do when it replays the token just emitted.
    fn absorb(&mut self, count: usize) {
        let mask = self.window.as_ref().len() - 1;
        for _ in 0..count {
            self.window.as_mut()[self.window_pos] = self.staging[self.input_pos];
            self.window_pos = (self.window_pos + 1) & mask;
            self.input_pos = (self.input_pos + 1) % STAGING_SIZE;
            self.input_size -= 1;
        }
    }

    /// Pick the match the next token encodes, `(index, size)`; a size below
    /// `min_pattern_size` means "emit a literal".
    fn select_match(&self) -> (usize, usize) {
        if self.input_size < self.min_pattern_size {
            return (0, 0);
        }
        let best = self.longest_match_from(0);
        if self.config.lazy_matching && best.1 >= self.min_pattern_size {
            let deferred = self.longest_match_from(1);
            if deferred.1 > best.1 {
                return (0, 0);
            }
        }
        best
    }

    /// Longest window match for the staged bytes starting at `skip`,
    /// scanning window indices upward and keeping the first best.
    fn longest_match_from(&self, skip: usize) -> (usize, usize) {
        let window = self.window.as_ref();
        let window_size = window.len();
        let budget = (self.input_size - skip).min(self.max_pattern_size);
        if budget < 2 {
            return (0, 0);
        }

        let first = self.staged(skip);
        let second = self.staged(skip + 1);
        let mut best_index = 0;
        let mut best_size = 0;
        for index in 0..window_size - 1 {
            if window[index] != first || window[index + 1] != second {
                continue;
            }
            let mut size = 2;
            while size < budget
                && index + size < window_size
                && window[index + size] == self.staged(skip + size)
            {
                size += 1;
            }
            if size > best_size {
                best_index = index;
                best_size = size;
                if best_size == budget {
                    break;
                }
            }
        }
        (best_index, best_size)
    }
}

/// Compress a whole buffer with the default configuration.
pub fn compress(input: &[u8]) -> Vec<u8> {
    compress_with(&Config::default(), input)
        .expect("the default configuration accepts every byte value")
}

/// Compress a whole buffer with an explicit configuration.
#[throws]
pub fn compress_with(config: &Config, input: &[u8]) -> Vec<u8> {
    let mut compressor = Compressor::new(config)?;
    let mut out = Vec::new();
    let mut chunk = [0u8; 512];

    let mut consumed = 0;
    while consumed < input.len() {
        let (_, used, written) = compressor.compress(&mut chunk, &input[consumed..])?;
        consumed += used;
        out.extend_from_slice(&chunk[..written]);
    }
    loop {
        let (flow, written) = compressor.flush(&mut chunk, false)?;
        out.extend_from_slice(&chunk[..written]);
        if flow == Flow::Done {
            break;
        }
    }
    out
}
