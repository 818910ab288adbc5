//! Seek index.
//!
//! Responsibilities:
//! - Collect (uncompressed offset, compressed offset) sample points while a stream is written
//! - Look up the nearest preceding sample for a target offset
//! - Serialize to and parse from the skippable index chunk
//!
//! Non-responsibilities:
//! - Decoding block contents
//! - Repositioning readers (see `stream::seek`)

pub mod decode;
pub mod encode;
pub mod types;

pub use types::{Index, IndexEntry, IndexError};
