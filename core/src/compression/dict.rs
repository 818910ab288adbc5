//! compression/dict.rs
//! Shared dictionaries for small, similar payloads.
//!
//! Wire form: `uvarint(repeat_start) ++ content`. The bytes from `repeat_start` to the end of
//! the content are the hot region; both encoder and decoder begin with the repeat offset
//! pointing at it, so a block opening with those bytes costs a single repeat token.
use thiserror::Error;

use crate::compression::block::{self, BlockOptions};
use crate::compression::constants::{MAX_DICT_SIZE, MIN_DICT_SIZE};
use crate::compression::types::{BlockError, CompressionLevel};
use crate::utils::{append_uvarint, read_uvarint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictError {
    #[error("dictionary is empty")]
    Empty,
    #[error("dictionary repeat prefix is malformed")]
    MalformedRepeat,
    #[error("dictionary content size {size} outside {min}..={max}")]
    InvalidSize { size: usize, min: usize, max: usize },
    #[error("repeat start {repeat} beyond content length {len}")]
    RepeatOutOfRange { repeat: usize, len: usize },
}

/// Immutable dictionary. Share it with `Arc` across concurrent encode/decode calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    content: Vec<u8>,
    repeat: usize,
}

impl Dictionary {
    /// Parse the serialized form produced by `to_bytes`.
    pub fn new(raw: &[u8]) -> Result<Self, DictError> {
        if raw.is_empty() {
            return Err(DictError::Empty);
        }
        let (repeat, n) = read_uvarint(raw).ok_or(DictError::MalformedRepeat)?;
        let repeat = usize::try_from(repeat).map_err(|_| DictError::MalformedRepeat)?;
        Self::from_parts(raw[n..].to_vec(), repeat)
    }

    /// Build from content and the index where the hot repeat region starts.
    pub fn from_parts(content: Vec<u8>, repeat_start: usize) -> Result<Self, DictError> {
        if !(MIN_DICT_SIZE..=MAX_DICT_SIZE).contains(&content.len()) {
            return Err(DictError::InvalidSize {
                size: content.len(),
                min: MIN_DICT_SIZE,
                max: MAX_DICT_SIZE,
            });
        }
        if repeat_start > content.len() {
            return Err(DictError::RepeatOutOfRange {
                repeat: repeat_start,
                len: content.len(),
            });
        }
        Ok(Self {
            content,
            repeat: repeat_start,
        })
    }

    /// Build from sample data, placing the hot region at the last occurrence of the longest
    /// prefix of `search_start` (at least 5 bytes) that leaves 8 bytes of content after it.
    ///
    /// Data beyond 64KiB is ignored. Without a usable occurrence the region starts at 0.
    pub fn build(data: &[u8], search_start: &[u8]) -> Result<Self, DictError> {
        if data.is_empty() {
            return Err(DictError::Empty);
        }
        let content = &data[..data.len().min(MAX_DICT_SIZE)];
        let mut repeat = 0;
        for n in (5..=search_start.len()).rev() {
            let needle = &search_start[..n];
            if let Some(idx) = content.windows(n).rposition(|w| w == needle) {
                if idx + 8 <= content.len() {
                    repeat = idx;
                    break;
                }
            }
        }
        Self::from_parts(content.to_vec(), repeat)
    }

    /// Serialized form accepted by `new`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.content.len() + 5);
        append_uvarint(&mut out, self.repeat as u64);
        out.extend_from_slice(&self.content);
        out
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Index where the hot repeat region starts.
    pub fn repeat_start(&self) -> usize {
        self.repeat
    }

    /// Length of the hot repeat region at the end of the content.
    pub fn repeat_len(&self) -> usize {
        self.content.len() - self.repeat
    }

    /// Repeat offset the codec starts with (0 when the region is empty).
    pub(crate) fn initial_offset(&self) -> usize {
        self.repeat_len()
    }

    pub fn encode(&self, src: &[u8]) -> Result<Vec<u8>, BlockError> {
        self.encode_level(src, CompressionLevel::Fast)
    }

    pub fn encode_better(&self, src: &[u8]) -> Result<Vec<u8>, BlockError> {
        self.encode_level(src, CompressionLevel::Better)
    }

    pub fn encode_best(&self, src: &[u8]) -> Result<Vec<u8>, BlockError> {
        self.encode_level(src, CompressionLevel::Best)
    }

    fn encode_level(&self, src: &[u8], level: CompressionLevel) -> Result<Vec<u8>, BlockError> {
        block::encode_with(src, BlockOptions::new(level).with_dict(self))
    }

    pub fn decode(&self, src: &[u8]) -> Result<Vec<u8>, BlockError> {
        block::decode_with_dict(src, Some(self))
    }
}
