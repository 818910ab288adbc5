//! stream/config.rs
//! Writer and reader configuration.
//!
//! Builders are infallible; `validate()` (called by the constructors) rejects combinations
//! that cannot be expressed on the wire.
use std::fmt;
use std::io::Read;
use std::sync::{Arc, Mutex};

use bitflags::bitflags;
use rand::RngCore;
use thiserror::Error;

use crate::compression::{CompressionLevel, Compressor, Dialect, Dictionary};
use crate::constants::{
    DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MAX_PADDING, MAX_SNAPPY_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
use crate::utils::clamp_block_size;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("dictionaries cannot be used in snappy compatible mode")]
    DictionaryWithSnappy,
    #[error("padding must be between 1 and {max}, got {got}")]
    InvalidPadding { got: usize, max: usize },
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WriterFlags: u8 {
        /// Append the seek index as the last chunk.
        const ADD_INDEX      = 0b0000_0001;
        /// Write a Snappy framed stream (identifier, no repeat tokens, 64KiB blocks, no index).
        const SNAPPY_COMPAT  = 0b0000_0010;
        /// Flush after every `write` call.
        const FLUSH_ON_WRITE = 0b0000_0100;
    }
}

/// Filler for padding chunks. The content never affects decoding.
#[derive(Clone, Default)]
pub enum PaddingSource {
    #[default]
    Zero,
    Random,
    Reader(Arc<Mutex<dyn Read + Send>>),
}

impl PaddingSource {
    pub fn from_reader(r: impl Read + Send + 'static) -> Self {
        PaddingSource::Reader(Arc::new(Mutex::new(r)))
    }

    pub(crate) fn fill(&self, buf: &mut [u8]) -> std::io::Result<()> {
        match self {
            PaddingSource::Zero => {
                buf.fill(0);
                Ok(())
            }
            PaddingSource::Random => {
                rand::thread_rng().fill_bytes(buf);
                Ok(())
            }
            PaddingSource::Reader(r) => {
                let mut guard = r
                    .lock()
                    .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "padding source poisoned"))?;
                guard.read_exact(buf)
            }
        }
    }
}

impl fmt::Debug for PaddingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaddingSource::Zero => f.write_str("Zero"),
            PaddingSource::Random => f.write_str("Random"),
            PaddingSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

#[derive(Clone)]
pub struct WriterConfig {
    pub block_size: usize,
    pub level: CompressionLevel,
    pub concurrency: usize,
    /// Output is padded to a multiple of this at close; 1 disables padding.
    pub padding: usize,
    pub padding_source: PaddingSource,
    pub flags: WriterFlags,
    pub dict: Option<Arc<Dictionary>>,
    pub compressor: Option<Arc<dyn Compressor>>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            level: CompressionLevel::Fast,
            concurrency: num_cpus::get().max(1),
            padding: 1,
            padding_source: PaddingSource::Zero,
            flags: WriterFlags::empty(),
            dict: None,
            compressor: None,
        }
    }
}

impl fmt::Debug for WriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterConfig")
            .field("block_size", &self.block_size)
            .field("level", &self.level)
            .field("concurrency", &self.concurrency)
            .field("padding", &self.padding)
            .field("padding_source", &self.padding_source)
            .field("flags", &self.flags)
            .field("dict", &self.dict.as_ref().map(|d| d.content().len()))
            .field("compressor", &self.compressor.as_ref().map(|c| c.name()))
            .finish()
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested block size, clamped to the allowed range.
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = clamp_block_size(size, MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        self
    }

    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_padding(mut self, multiple: usize) -> Self {
        self.padding = multiple;
        self
    }

    pub fn with_padding_source(mut self, src: PaddingSource) -> Self {
        self.padding_source = src;
        self
    }

    pub fn with_index(mut self, on: bool) -> Self {
        self.flags.set(WriterFlags::ADD_INDEX, on);
        self
    }

    pub fn with_snappy_compat(mut self, on: bool) -> Self {
        self.flags.set(WriterFlags::SNAPPY_COMPAT, on);
        self
    }

    pub fn with_flush_on_write(mut self, on: bool) -> Self {
        self.flags.set(WriterFlags::FLUSH_ON_WRITE, on);
        self
    }

    pub fn with_dict(mut self, dict: Arc<Dictionary>) -> Self {
        self.dict = Some(dict);
        self
    }

    pub fn with_compressor(mut self, c: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(c);
        self
    }

    pub fn snappy(&self) -> bool {
        self.flags.contains(WriterFlags::SNAPPY_COMPAT)
    }

    pub fn dialect(&self) -> Dialect {
        if self.snappy() {
            Dialect::Snappy
        } else {
            Dialect::S2
        }
    }

    /// Block size in effect, after the snappy limit.
    pub fn effective_block_size(&self) -> usize {
        let size = clamp_block_size(self.block_size, MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        if self.snappy() {
            size.min(MAX_SNAPPY_BLOCK_SIZE)
        } else {
            size
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dict.is_some() && self.snappy() {
            return Err(ConfigError::DictionaryWithSnappy);
        }
        if self.padding == 0 || self.padding > MAX_PADDING {
            return Err(ConfigError::InvalidPadding {
                got: self.padding,
                max: MAX_PADDING,
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Largest decoded block accepted; larger declared sizes are treated as corruption.
    pub max_block_size: usize,
    /// Start in streaming state without requiring the identifier chunk.
    pub ignore_stream_identifier: bool,
    pub dict: Option<Arc<Dictionary>>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_block_size: MAX_BLOCK_SIZE,
            ignore_stream_identifier: false,
            dict: None,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_block_size(mut self, size: usize) -> Self {
        self.max_block_size = clamp_block_size(size, MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        self
    }

    pub fn with_ignore_stream_identifier(mut self, on: bool) -> Self {
        self.ignore_stream_identifier = on;
        self
    }

    pub fn with_dict(mut self, dict: Arc<Dictionary>) -> Self {
        self.dict = Some(dict);
        self
    }
}
