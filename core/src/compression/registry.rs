//! compression/registry.rs
//! Built-in `Compressor` implementations and the factory the stream writer uses.
use std::sync::Arc;

use crate::compression::block::{max_encoded_len, try_encode_into, BlockOptions};
use crate::compression::dict::Dictionary;
use crate::compression::types::{BlockError, CompressionLevel, Compressor, Dialect, Encoded};

/// Encodes with one of the built-in match finders.
#[derive(Debug, Clone)]
pub struct LevelCompressor {
    level: CompressionLevel,
    dialect: Dialect,
    dict: Option<Arc<Dictionary>>,
}

impl LevelCompressor {
    pub fn new(level: CompressionLevel, dialect: Dialect, dict: Option<Arc<Dictionary>>) -> Self {
        Self { level, dialect, dict }
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }
}

impl Compressor for LevelCompressor {
    fn compress_block(&self, src: &[u8], out: &mut Vec<u8>) -> Result<Encoded, BlockError> {
        let need = max_encoded_len(src.len()).ok_or(BlockError::TooLarge { len: src.len() })?;
        let start = out.len();
        out.resize(start + need, 0);
        let mut opts = BlockOptions::new(self.level).with_dialect(self.dialect);
        if let Some(d) = self.dict.as_deref() {
            opts = opts.with_dict(d);
        }
        let res = try_encode_into(&mut out[start..], src, opts);
        match res {
            Ok(Encoded::Compressed(n)) => out.truncate(start + n),
            _ => out.truncate(start),
        }
        res
    }

    fn name(&self) -> &'static str {
        match self.level {
            CompressionLevel::Uncompressed => "uncompressed",
            CompressionLevel::Fast => "fast",
            CompressionLevel::Better => "better",
            CompressionLevel::Best => "best",
        }
    }
}

/// Never compresses; every block is stored raw.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCompressor;

impl Compressor for StoreCompressor {
    fn compress_block(&self, _src: &[u8], _out: &mut Vec<u8>) -> Result<Encoded, BlockError> {
        Ok(Encoded::Literal)
    }

    fn name(&self) -> &'static str {
        "store"
    }
}

/// Resolve a level, dialect and optional dictionary to a shareable compressor.
pub fn create_compressor(
    level: CompressionLevel,
    dialect: Dialect,
    dict: Option<Arc<Dictionary>>,
) -> Result<Arc<dyn Compressor>, BlockError> {
    if dict.is_some() && dialect == Dialect::Snappy {
        return Err(BlockError::Unsupported("dictionaries need the S2 dialect"));
    }
    Ok(match level {
        CompressionLevel::Uncompressed => Arc::new(StoreCompressor),
        _ => Arc::new(LevelCompressor::new(level, dialect, dict)),
    })
}
