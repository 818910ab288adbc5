//! s2-core
//!
//! Pure Rust S2 block codec and framed stream engine, compatible with Snappy.
//! No FFI, no unsafe.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

// Block layer
pub mod compression;
pub mod index;
pub mod telemetry;

// Stream layer
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{
        decode, encode, encode_best, encode_better, max_encoded_len, CompressionLevel, Dictionary,
    };
    pub use crate::index::Index;
    pub use crate::stream::{
        compress_stream, decompress_stream, PaddingSource, ReadSeeker, Reader, ReaderConfig,
        Writer, WriterConfig,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::StreamError;
}
