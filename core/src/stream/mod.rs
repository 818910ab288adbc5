//! Framed streams.
//!
//! Responsibilities:
//! - Chunk framing, checksums and padding
//! - Writer with an ordered, bounded worker pool and an index of chunk boundaries
//! - Reader with skip, and a seekable reader driven by the index
//!
//! Non-responsibilities:
//! - Block token format (see `compression`)

pub mod compression_worker;
pub mod config;
pub mod core;
pub mod framing;
pub mod io;
pub mod parallelism;
pub mod reader;
pub mod seek;
pub mod writer;

pub use self::core::{compress_stream, decompress_stream};
pub use config::{ConfigError, PaddingSource, ReaderConfig, WriterConfig, WriterFlags};
pub use reader::Reader;
pub use seek::ReadSeeker;
pub use writer::Writer;
