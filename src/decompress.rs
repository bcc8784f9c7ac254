//! The decompression half of the codec.
//!
//! Decoding is a single pass over the bit stream: peek the flag bit, read a
//! literal or a length code plus window index, emit the bytes and feed them
//! back into the window. Every call is resumable at both ends: a token cut
//! off by the end of input rewinds the bit reader and waits for more bytes,
//! and a pattern cut off by a full output buffer is parked and finished on
//! the next call.
//!
//! The bytes of a pattern are latched from the window before any of them is
//! written back. The compressor selects matches against the window as it
//! stood before the token, including matches that run into the write cursor,
//! so replaying against the pre-token window is what keeps both sides
//! identical.

use fehler::{throw, throws};
use thiserror::Error;

use crate::bits::BitReader;
use crate::dict::initialize_dictionary;
use crate::header::{read_header, Config, ConfigError};
use crate::{Flow, FLUSH_CODE, LENGTH_CODES, STAGING_SIZE};

/// Errors when decompressing a Tamp stream.
///
/// All of these are fatal for the stream: discard the instance (truncated
/// input and full output buffers are *not* errors, see [`Flow`]).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    #[error("back-reference at index {index} with length {length} runs past the {window_size}-byte window")]
    OutOfBounds {
        index: usize,
        length: usize,
        window_size: usize,
    },
    #[error("bit stream holds a prefix that is not a length code")]
    CorruptLengthCode,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
type Error = DecompressError; // do it this way for better docs

/// What the length-code walk produced.
enum LengthToken {
    /// Index into [`LENGTH_CODES`].
    Length(usize),
    /// The flush marker; realign and keep going.
    Flush,
}

/// A pattern whose emission was interrupted by a full output buffer.
///
/// The source bytes are captured here at decode time, so resuming never
/// re-reads window slots that emitted bytes have since overwritten.
struct PendingCopy {
    bytes: [u8; STAGING_SIZE],
    length: usize,
    emitted: usize,
}

/// A streaming Tamp decompressor.
///
/// `W` is the window storage, any `[u8]`-backed buffer of exactly
/// `config.window_size()` bytes; [`Decompressor::new`] boxes one for you.
/// Configuration comes from [`read_header`] or out-of-band agreement.
pub struct Decompressor<W = Box<[u8]>> {
    config: Config,
    min_pattern_size: usize,
    window: W,
    window_pos: usize,
    bits: BitReader,
    pending: Option<PendingCopy>,
}

impl Decompressor {
    /// Allocate window storage and set up a decompressor.
    ///
    /// Fails on out-of-range parameters, or if the stream calls for a custom
    /// dictionary (use [`Decompressor::with_window`] to supply one).
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

impl<W: AsRef<[u8]> + AsMut<[u8]>> Decompressor<W> {
    /// Set up a decompressor over caller-provided window storage.
    ///
    /// `window` must hold exactly `config.window_size()` bytes. Under
    /// `use_custom_dictionary` its current contents must be the same
    /// dictionary the compressor started from; otherwise it is overwritten
    /// with the deterministic fill.
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

        Decompressor {
            config: *config,
            min_pattern_size: config.min_pattern_size(),
            window,
            window_pos: 0,
            bits: BitReader::new(),
            pending: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode tokens from `input` into `out` until one side runs out.
    ///
    /// Returns the flow status plus `(input consumed, output written)`.
    /// Consumed bytes are gone (their unread bits live on inside the
    /// decompressor), so pass only the remainder next time.
    /// [`Flow::InputExhausted`] means the next token is incomplete -- which
    /// at the true end of a stream is simply "done", since streams end with
    /// sub-byte zero padding. [`Flow::OutputFull`] means `out` filled up;
    /// state is parked so the very next byte comes out on the next call.
    #[throws]
    pub fn decompress(&mut self, out: &mut [u8], input: &[u8]) -> (Flow, usize, usize) {
        let mut consumed = 0;
        let mut written = 0;

        if let Some(mut copy) = self.pending.take() {
            self.replay(&mut copy, out, &mut written);
            if copy.emitted < copy.length {
                self.pending = Some(copy);
                return (Flow::OutputFull, consumed, written);
            }
        }

        loop {
            consumed += self.bits.refill(&input[consumed..]);
            let checkpoint = self.bits;

            let flag = match self.bits.take(1) {
                Some(flag) => flag,
                None => return (Flow::InputExhausted, consumed, written),
            };

            let mut copy = if flag == 1 {
                let value = match self.bits.take(self.config.literal_bits) {
                    Some(value) => value,
                    None => {
                        self.bits = checkpoint;
                        return (Flow::InputExhausted, consumed, written);
                    }
                };
                let mut copy = PendingCopy {
                    bytes: [0; STAGING_SIZE],
                    length: 1,
                    emitted: 0,
                };
                copy.bytes[0] = value as u8;
                copy
            } else {
                match self.decode_length()? {
                    None => {
                        self.bits = checkpoint;
                        return (Flow::InputExhausted, consumed, written);
                    }
                    Some(LengthToken::Flush) => {
                        self.bits.align_to_byte();
                        continue;
                    }
                    Some(LengthToken::Length(code_index)) => {
                        let length = self.min_pattern_size + code_index;
                        let index = match self.bits.take(self.config.window_bits) {
                            Some(index) => index as usize,
                            None => {
                                self.bits = checkpoint;
                                return (Flow::InputExhausted, consumed, written);
                            }
                        };
                        let window = self.window.as_ref();
                        if index + length > window.len() {
                            throw!(Error::OutOfBounds {
                                index,
                                length,
                                window_size: window.len(),
                            });
                        }
                        let mut copy = PendingCopy {
                            bytes: [0; STAGING_SIZE],
                            length,
                            emitted: 0,
                        };
                        copy.bytes[..length].copy_from_slice(&window[index..index + length]);
                        copy
                    }
                }
            };

            self.replay(&mut copy, out, &mut written);
            if copy.emitted < copy.length {
                self.pending = Some(copy);
                return (Flow::OutputFull, consumed, written);
            }
        }
    }

    /// Decode the whole remainder of a stream into a vector.
    ///
    /// `input` must carry everything after the header; truncation is
    /// indistinguishable from end-of-stream padding, as in any Tamp decode.
    #[throws]
    pub fn decompress_to_vec(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 512];
        let mut consumed = 0;
        loop {
            let (flow, used, written) = self.decompress(&mut chunk, &input[consumed..])?;
            consumed += used;
            out.extend_from_slice(&chunk[..written]);
            if flow == Flow::InputExhausted {
                break;
            }
        }
        out
    }

    /// Move bytes of `copy` that still fit into `out`, mirroring each into
    /// the window exactly as the compressor did on its side.
    fn replay(&mut self, copy: &mut PendingCopy, out: &mut [u8], written: &mut usize) {
        let mask = self.window.as_ref().len() - 1;
        while copy.emitted < copy.length && *written < out.len() {
            let byte = copy.bytes[copy.emitted];
            out[*written] = byte;
            *written += 1;
            copy.emitted += 1;
            self.window.as_mut()[self.window_pos] = byte;
            self.window_pos = (self.window_pos + 1) & mask;
        }
    }

    /// Walk the zero-led prefix code one bit at a time.
    ///
    /// `Ok(None)` means the buffered bits ran out mid-code (the caller
    /// rewinds). The code is complete once the flush marker is counted in,
    /// so the corrupt arm is a guard, not an expected path.
    #[throws]
    fn decode_length(&mut self) -> Option<LengthToken> {
        let mut code: u32 = 0;
        let mut code_bits: u8 = 1;
        loop {
            let bit = match self.bits.take(1) {
                Some(bit) => bit,
                None => return None,
            };
            code = code << 1 | bit;
            code_bits += 1;

            for (code_index, &entry) in LENGTH_CODES.iter().enumerate() {
                if entry == (code, code_bits) {
                    return Some(LengthToken::Length(code_index));
                }
            }
            if (code, code_bits) == FLUSH_CODE {
                return Some(LengthToken::Flush);
            }
            if code_bits >= 9 {
                throw!(Error::CorruptLengthCode);
            }
        }
    }
}

/// Decompress a complete stream, header included, into a vector.
///
/// Streams that call for a custom dictionary are rejected here; use
/// [`decompress_with_dictionary`].
#[throws]
pub fn decompress(input: &[u8]) -> Vec<u8> {
    let (config, header_size) = read_header(input)?;
    if config.use_custom_dictionary {
        throw!(Error::Config(ConfigError::MissingDictionary));
    }
    let mut decompressor = Decompressor::new(&config)?;
    decompressor.decompress_to_vec(&input[header_size..])?
}

/// Decompress a complete stream whose header calls for a custom dictionary.
///
/// `dictionary` must be the `1 << window_bits` bytes the compressor started
/// from; it is copied into freshly allocated window storage.
#[throws]
pub fn decompress_with_dictionary(input: &[u8], dictionary: &[u8]) -> Vec<u8> {
    let (config, header_size) = read_header(input)?;
    let mut decompressor = Decompressor::with_window(&config, dictionary.to_vec())?;
    decompressor.decompress_to_vec(&input[header_size..])?
}

#[cfg(test)]
mod test {
    use super::{decompress, DecompressError, Decompressor};
    use crate::header::Config;
    use crate::Flow;

    #[test]
    fn bare_header_decodes_to_nothing() {
        assert_eq!(decompress(&[0x58]).unwrap(), b"");
    }

    #[test]
    fn literal_tokens_decode() {
        // 0x58 header, then literals 'h' and 'i' and zero padding.
        // 1 01101000 1 01101001 ______ -> 0xB4, 0x5A, 0x40.
        assert_eq!(decompress(&[0x58, 0xb4, 0x5a, 0x40]).unwrap(), b"hi");
    }

    #[test]
    fn trailing_padding_is_not_a_token() {
        let (flow, consumed, written) = Decompressor::new(&Config::default())
            .unwrap()
            .decompress(&mut [0u8; 16], &[0b0000_0000])
            .unwrap();
        assert_eq!((flow, consumed, written), (Flow::InputExhausted, 1, 0));
    }

    #[test]
    fn one_byte_output_buffers_still_work() {
        let compressed = crate::compress(b"windy windy windy waves");
        let (config, header) = crate::read_header(&compressed).unwrap();
        let mut decompressor = Decompressor::new(&config).unwrap();

        let mut out = Vec::new();
        let mut slot = [0u8; 1];
        let mut input = &compressed[header..];
        loop {
            let (flow, used, written) = decompressor.decompress(&mut slot, input).unwrap();
            input = &input[used..];
            out.extend_from_slice(&slot[..written]);
            match flow {
                Flow::OutputFull => continue,
                Flow::InputExhausted => break,
                Flow::Done => unreachable!("decompress never claims Done"),
            }
        }
        assert_eq!(out, b"windy windy windy waves");
    }

    #[test]
    fn one_byte_input_chunks_still_work() {
        let compressed = crate::compress(b"drip drip drip drop");
        let (config, header) = crate::read_header(&compressed).unwrap();
        let mut decompressor = Decompressor::new(&config).unwrap();

        let mut out = Vec::new();
        let mut chunk = [0u8; 64];
        for &byte in &compressed[header..] {
            let (_, used, written) = decompressor.decompress(&mut chunk, &[byte]).unwrap();
            assert_eq!(used, 1);
            out.extend_from_slice(&chunk[..written]);
        }
        assert_eq!(out, b"drip drip drip drop");
    }

    #[test]
    fn oversized_backreference_is_fatal_and_emits_nothing() {
        // Length-5 code (01011) followed by index 1023, all ones: the copy
        // would run two bytes past the window.
        let stream = [0x58, 0b0101_1111, 0b1111_1110];
        let (config, header) = crate::read_header(&stream).unwrap();
        let mut decompressor = Decompressor::new(&config).unwrap();
        let mut out = [0u8; 32];
        let result = decompressor.decompress(&mut out, &stream[header..]);
        assert_eq!(
            result,
            Err(DecompressError::OutOfBounds {
                index: 1023,
                length: 5,
                window_size: 1024,
            })
        );
    }

    #[test]
    fn missing_dictionary_is_reported() {
        let header = Config::default().custom_dictionary(true).to_header_byte();
        assert_eq!(
            decompress(&[header]),
            Err(DecompressError::Config(
                crate::ConfigError::MissingDictionary
            ))
        );
    }
}
