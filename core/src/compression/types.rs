//! compression/types.rs
//! Block codec errors, effort levels and the `Compressor` seam used by the stream writer.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the block encoder and decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    /// The token stream is malformed: bad tag, offset outside block and dictionary,
    /// overrun past the declared length or truncated input.
    #[error("corrupt block input")]
    Corrupt,
    /// Input is larger than the block format can describe.
    #[error("block too large: {len} bytes")]
    TooLarge { len: usize },
    /// Destination is smaller than the size bound for this input.
    #[error("destination too small: have {have}, need {need}")]
    BufferTooSmall { have: usize, need: usize },
    /// The requested option combination is not expressible in the token dialect.
    #[error("unsupported block options: {0}")]
    Unsupported(&'static str),
}

/// Compression effort. `Uncompressed` stores blocks as-is.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionLevel {
    Uncompressed,
    #[default]
    Fast,
    Better,
    Best,
}

/// Token dialect written by the encoder. The decoder accepts both.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Full S2 token set, including repeat-offset copies and dictionary references.
    #[default]
    S2,
    /// Snappy-compatible tokens only.
    Snappy,
}

/// Outcome of one block encode attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoded {
    /// A block of this many bytes (length header included) was written.
    Compressed(usize),
    /// Matching did not shrink the input; the caller should store it raw
    /// (or as a literal-only block).
    Literal,
}

impl Encoded {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Encoded::Compressed(_))
    }
}

/// Block compressor used by the stream writer and its worker pool.
///
/// Implementations must be shareable across worker threads.
pub trait Compressor: Send + Sync {
    /// Append the encoded block for `src` to `out`.
    ///
    /// On `Encoded::Literal`, `out` is left unchanged.
    fn compress_block(&self, src: &[u8], out: &mut Vec<u8>) -> Result<Encoded, BlockError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}
