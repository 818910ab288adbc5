use std::{io, sync::Arc};
use thiserror::Error;

use crate::{
    compression::{BlockError, DictError},
    index::IndexError,
    stream::{config::ConfigError, framing::FrameError},
};

/// Unified stream error covering I/O, block, frame, index and configuration failures.
/// - Ergonomic `From<T>` impls enable `?` across the pipeline.
/// - `Clone` so writers and readers can keep the first failure sticky.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// I/O error from the underlying source or destination, propagated verbatim.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Block codec error (corrupt tokens, size bounds).
    #[error("block error: {0}")]
    Block(#[from] BlockError),

    /// Dictionary could not be parsed or built.
    #[error("dictionary error: {0}")]
    Dict(#[from] DictError),

    /// Chunk-level error (validation or parse).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Index construction, lookup or parse error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Rejected writer/reader configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Write attempted after close.
    #[error("writer is closed")]
    Closed,

    /// Random access requested but not possible.
    #[error("cannot seek: {0}")]
    CantSeek(String),

    /// Worker pool failure.
    #[error("pipeline error: {0}")]
    PipelineError(&'static str),

    /// Generic high-level validation with a descriptive message.
    #[error("validation error: {0}")]
    Validation(String),
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(Arc::new(e))
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match e {
            StreamError::Io(inner) => {
                return Arc::try_unwrap(inner)
                    .unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string()));
            }
            StreamError::Frame(FrameError::Truncated) => io::ErrorKind::UnexpectedEof,
            StreamError::Config(_)
            | StreamError::Closed
            | StreamError::CantSeek(_)
            | StreamError::Validation(_) => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}
