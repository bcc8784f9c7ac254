//! Stream configuration and the one-byte header that carries it.
//!
//! Header layout, MSB first: 3 bits `window_bits - 8`, 2 bits
//! `literal_bits - 5`, 1 bit custom-dictionary flag, 1 reserved bit (written
//! zero), 1 continuation bit (no continuation bytes are defined, so it must
//! be zero).

use fehler::{throw, throws};
use thiserror::Error;

/// Errors from validating parameters, headers, or window storage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window must span 8..=15 bits, got {0}")]
    WindowBits(u8),
    #[error("literals must span 5..=8 bits, got {0}")]
    LiteralBits(u8),
    #[error("header advertises continuation bytes, which no known stream version defines")]
    TrailingHeader,
    #[error("window storage must hold exactly {expected} bytes, got {actual}")]
    WindowStorage { expected: usize, actual: usize },
    #[error("the stream calls for a custom dictionary but none was supplied")]
    MissingDictionary,
    #[error("input ended before the stream header")]
    TruncatedHeader,
}

/// Per-stream codec parameters.
///
/// The defaults (10-bit window, 8-bit literals) match what the header byte
/// `0x58` describes and are a good fit for general byte streams; drop
/// `literal_bits` to 7 or less only when every input byte is known to fit.
/// Out-of-range values are caught when a compressor or decompressor is
/// initialized, or earlier by the checked builder methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Window size in bits (8..=15); the window itself is `1 << window_bits`
    /// bytes on both sides of the stream.
    pub window_bits: u8,
    /// Payload bits per literal token (5..=8).
    pub literal_bits: u8,
    /// Start from caller-supplied window contents instead of the shared
    /// deterministic fill. Both sides must agree on the dictionary bytes.
    pub use_custom_dictionary: bool,
    /// Defer a match when the next position matches longer. Encoder-local:
    /// decoding is unaffected and nothing about it is on the wire, but the
    /// emitted bytes differ from the reference policy, so leave it off when
    /// byte-exact output matters.
    pub lazy_matching: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_bits: 10,
            literal_bits: 8,
            use_custom_dictionary: false,
            lazy_matching: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window size as a power of two, 8..=15 bits.
    ///
    /// A larger window finds more matches but costs `1 << bits` bytes of
    /// state on both sides of the stream.
    #[throws(ConfigError)]
    pub fn window_bits(mut self, bits: u8) -> Self {
        if !(8..=15).contains(&bits) {
            throw!(ConfigError::WindowBits(bits));
        }
        self.window_bits = bits;
        self
    }

    /// Set how many payload bits a literal carries, 5..=8.
    ///
    /// Bytes with bits above this width cannot be encoded and are reported
    /// as [`CompressError::ExcessBits`](crate::CompressError).
    #[throws(ConfigError)]
    pub fn literal_bits(mut self, bits: u8) -> Self {
        if !(5..=8).contains(&bits) {
            throw!(ConfigError::LiteralBits(bits));
        }
        self.literal_bits = bits;
        self
    }

    pub fn custom_dictionary(mut self, enabled: bool) -> Self {
        self.use_custom_dictionary = enabled;
        self
    }

    pub fn lazy_matching(mut self, enabled: bool) -> Self {
        self.lazy_matching = enabled;
        self
    }

    /// Window size in bytes, `1 << window_bits`.
    pub fn window_size(&self) -> usize {
        1 << self.window_bits
    }

    #[throws(ConfigError)]
    pub(crate) fn validate(&self) {
        if !(8..=15).contains(&self.window_bits) {
            throw!(ConfigError::WindowBits(self.window_bits));
        }
        if !(5..=8).contains(&self.literal_bits) {
            throw!(ConfigError::LiteralBits(self.literal_bits));
        }
    }

    /// Shortest match worth a pattern token (2 or 3 bytes).
    ///
    /// With a big window and narrow literals a pattern token gets expensive
    /// relative to literals, so the threshold moves up to 3.
    pub(crate) fn min_pattern_size(&self) -> usize {
        2 + usize::from(self.window_bits > 10 + 2 * (self.literal_bits - 5))
    }

    /// Longest encodable match: 14 length codes above the minimum.
    pub(crate) fn max_pattern_size(&self) -> usize {
        self.min_pattern_size() + 13
    }

    /// Pack the header byte. The lazy-matching heuristic is encoder-local
    /// and deliberately absent from the wire.
    pub(crate) fn to_header_byte(&self) -> u8 {
        (self.window_bits - 8) << 5
            | (self.literal_bits - 5) << 3
            | u8::from(self.use_custom_dictionary) << 2
    }

    /// Decode a header byte.
    ///
    /// The two size fields cannot fall outside their ranges, so the only
    /// rejection is a set continuation bit; the reserved bit is ignored.
    #[throws(ConfigError)]
    pub(crate) fn from_header_byte(byte: u8) -> Self {
        if byte & 1 != 0 {
            throw!(ConfigError::TrailingHeader);
        }
        Self {
            window_bits: (byte >> 5) + 8,
            literal_bits: ((byte >> 3) & 0b11) + 5,
            use_custom_dictionary: byte & 0b100 != 0,
            lazy_matching: false,
        }
    }
}

/// Decode the configuration header at the front of `input`.
///
/// Returns the configuration and how many bytes it occupied (always 1).
/// Fails with [`ConfigError::TruncatedHeader`] on empty input; feeding the
/// same data again once more bytes arrived is fine.
#[throws(ConfigError)]
pub fn read_header(input: &[u8]) -> (Config, usize) {
    match input.first() {
        Some(&byte) => (Config::from_header_byte(byte)?, 1),
        None => throw!(ConfigError::TruncatedHeader),
    }
}
