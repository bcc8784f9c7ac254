//! Tamp is a low-memory, DEFLATE-inspired lossless compression codec.
//!
//! The format was designed for microcontrollers: the only working memory the
//! codec needs is the sliding window itself (256 bytes to 32 KiB, chosen per
//! stream), a 16-byte lookahead and a 32-bit bit accumulator. Every stream is
//! self-describing: a one-byte header carries the window size, the literal
//! width and whether a caller-supplied dictionary is required.
//!
//! The compressed stream is a bit-packed sequence of tokens. A literal token
//! is a `1` flag bit followed by the byte in `literal_bits` bits; a pattern
//! token is a Huffman-coded match length followed by a `window_bits` index
//! into the window. Compressor and decompressor update the window in
//! lockstep, so a back-reference is just "copy from where those bytes already
//! sit".
//!
//! The codec itself never allocates; window storage is caller-provided (or
//! boxed by the convenience constructors). On top of it, [`stream`] offers
//! `std::io` adapters and [`compress`]/[`decompress`] do whole buffers in one
//! call.

#![forbid(unsafe_code)]

mod bits;
pub mod compress;
pub mod decompress;
pub mod dict;
pub mod header;
pub mod stream;

pub use compress::{compress, compress_with, CompressError, Compressor};
pub use decompress::{decompress, decompress_with_dictionary, DecompressError, Decompressor};
pub use header::{read_header, Config, ConfigError};

/// The compressor decides each token from at most this much lookahead.
///
/// It also bounds the pattern length: `max_pattern_size` never exceeds it.
pub(crate) const STAGING_SIZE: usize = 16;

/// Canonical code for each pattern-length index, as `(code, bit count)`.
///
/// Index `i` encodes a match of `min_pattern_size + i` bytes. All codes start
/// with a `0` bit, which is what separates them from literals on the wire.
pub(crate) const LENGTH_CODES: [(u32, u8); 14] = [
    (0b00, 2),
    (0b011, 3),
    (0b01000, 5),
    (0b01011, 5),
    (0b010100, 6),
    (0b0100100, 7),
    (0b0100110, 7),
    (0b0101011, 7),
    (0b01001011, 8),
    (0b01010100, 8),
    (0b010010100, 9),
    (0b010010101, 9),
    (0b010101010, 9),
    (0b0100111, 7),
];

/// The flush marker: 0xAB written out in 9 bits.
///
/// It occupies the single codeword the length codes leave unused, which makes
/// the zero-led code complete; it can therefore never be mistaken for a
/// length, and never collides with a literal in any `literal_bits` mode. The
/// compressor byte-aligns the stream right after emitting it, and the
/// decompressor discards the padding when it sees it.
pub(crate) const FLUSH_CODE: (u32, u8) = (0xAB, 9);

/// How a streaming call ended.
///
/// `OutputFull` and `InputExhausted` are ordinary flow control, not errors:
/// the instance keeps enough state that calling again with fresh buffer space
/// (or more input) picks up exactly where it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Everything the call was asked to do is done.
    Done,
    /// The output buffer filled up; retry with more space to continue.
    OutputFull,
    /// The input ran dry mid-token; supply more bytes and retry. For a
    /// decompressor that has consumed a whole stream this is the normal
    /// end-of-data result.
    InputExhausted,
}
