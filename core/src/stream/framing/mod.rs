//! Wire framing for S2 streams.
//!
//! Responsibilities:
//! - Define chunk types and headers
//! - Encode identifier, data, and padding chunks
//! - Parse chunk headers and verify checksums with strict validation
//!
//! Non-responsibilities:
//! - Block token semantics
//! - IO
//! - Parallelism

pub mod decode;
pub mod encode;
pub mod types;

pub use types::{ChunkHeader, ChunkKind, ChunkType, FrameError};
