//! compression/mod.rs
//! S2 block codec.
//!
//! Responsibilities:
//! - Encode one buffer into a self-contained block at three effort levels.
//! - Decode blocks, optionally against a shared dictionary.
//! - Expose the `Compressor` seam the stream writer drives from its worker pool.
//!
//! Non-responsibilities:
//! - Framing, checksums and stream state (see `stream`).

pub mod block;
pub(crate) mod codecs;
pub mod constants;
pub(crate) mod decode;
pub mod dict;
pub(crate) mod emit;
pub mod registry;
pub mod types;
pub(crate) mod window;

pub use block::{
    decode, decode_into, decode_with_dict, decoded_len, encode, encode_best, encode_better,
    encode_into, encode_snappy, encode_with, max_encoded_len, try_encode_into, BlockOptions,
};
pub use dict::{DictError, Dictionary};
pub use registry::{create_compressor, LevelCompressor, StoreCompressor};
pub use types::{BlockError, CompressionLevel, Compressor, Dialect, Encoded};
