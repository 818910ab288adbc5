use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::index_markers::{MAX_ENTRIES, MIN_ENTRY_DISTANCE, MIN_KEPT_ENTRIES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("index offsets must increase: previous ({prev_uncompressed}, {prev_compressed}), got ({uncompressed}, {compressed})")]
    NotMonotonic {
        prev_uncompressed: i64,
        prev_compressed: i64,
        uncompressed: i64,
        compressed: i64,
    },
    #[error("index has no entries")]
    Empty,
    #[error("offset {0} precedes the first index entry")]
    BeforeFirstEntry(i64),
    #[error("offset {offset} outside stream of {total} bytes")]
    OutOfRange { offset: i64, total: i64 },
    #[error("relative offset needs a known uncompressed size")]
    UnknownSize,
    #[error("corrupt index: {0}")]
    Corrupt(&'static str),
    #[error("not an index chunk")]
    Unsupported,
    #[error("index truncated")]
    UnexpectedEof,
    #[error("index has {0} entries, more than allowed")]
    TooManyEntries(usize),
}

/// One sample point: a chunk boundary at `uncompressed` in the decoded stream, found at
/// `compressed` in the encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "compressed")]
    pub compressed: i64,
    #[serde(rename = "uncompressed")]
    pub uncompressed: i64,
}

/// Sparse, strictly increasing table of sample points.
///
/// Totals are `-1` while unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub total_uncompressed: i64,
    pub total_compressed: i64,
    #[serde(rename = "offsets")]
    pub(crate) entries: Vec<IndexEntry>,
    #[serde(rename = "est_block_uncompressed")]
    pub(crate) est_block_uncomp: i64,
}

impl Default for Index {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Index {
    /// Empty index for a stream with blocks of roughly `block_size` bytes.
    pub fn new(block_size: usize) -> Self {
        Self {
            total_uncompressed: -1,
            total_compressed: -1,
            entries: Vec::new(),
            est_block_uncomp: block_size as i64,
        }
    }

    pub fn reset(&mut self, block_size: usize) {
        self.total_uncompressed = -1;
        self.total_compressed = -1;
        self.entries.clear();
        self.est_block_uncomp = block_size as i64;
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn estimated_block_size(&self) -> i64 {
        self.est_block_uncomp
    }

    /// Append a sample point. Both offsets must be strictly greater than the previous entry's.
    pub fn add(&mut self, uncompressed: i64, compressed: i64) -> Result<(), IndexError> {
        if uncompressed < 0 || compressed < 0 {
            return Err(IndexError::Corrupt("negative offset"));
        }
        if let Some(last) = self.entries.last() {
            if uncompressed <= last.uncompressed || compressed <= last.compressed {
                return Err(IndexError::NotMonotonic {
                    prev_uncompressed: last.uncompressed,
                    prev_compressed: last.compressed,
                    uncompressed,
                    compressed,
                });
            }
        }
        self.entries.push(IndexEntry {
            compressed,
            uncompressed,
        });
        Ok(())
    }

    /// Nearest entry at or before `offset`, as `(compressed, uncompressed)`.
    ///
    /// A negative `offset` counts back from the end and needs a known uncompressed total.
    pub fn find(&self, offset: i64) -> Result<(i64, i64), IndexError> {
        let mut offset = offset;
        if offset < 0 {
            if self.total_uncompressed < 0 {
                return Err(IndexError::UnknownSize);
            }
            offset += self.total_uncompressed;
            if offset < 0 {
                return Err(IndexError::OutOfRange {
                    offset,
                    total: self.total_uncompressed,
                });
            }
        }
        if self.total_uncompressed >= 0 && offset > self.total_uncompressed {
            return Err(IndexError::OutOfRange {
                offset,
                total: self.total_uncompressed,
            });
        }
        let first = self.entries.first().ok_or(IndexError::Empty)?;
        if offset < first.uncompressed {
            return Err(IndexError::BeforeFirstEntry(offset));
        }
        let n = self.entries.partition_point(|e| e.uncompressed <= offset);
        let e = self.entries[n - 1];
        Ok((e.compressed, e.uncompressed))
    }

    /// Record stream totals and downsample before the index is written.
    pub fn finalize(&mut self, total_uncompressed: i64, total_compressed: i64) {
        self.total_uncompressed = total_uncompressed;
        self.total_compressed = total_compressed;
        self.reduce();
    }

    /// Thin out entries so they are roughly `MIN_ENTRY_DISTANCE` apart, keeping at least
    /// `MIN_KEPT_ENTRIES` and never more than `MAX_ENTRIES`.
    pub fn reduce(&mut self) {
        if self.entries.len() < MAX_ENTRIES && self.est_block_uncomp >= MIN_ENTRY_DISTANCE {
            return;
        }
        let mut remove_n = (self.entries.len() + 1) / MAX_ENTRIES;
        while self.est_block_uncomp * (remove_n as i64 + 1) < MIN_ENTRY_DISTANCE
            && self.entries.len() / (remove_n + 2) > MIN_KEPT_ENTRIES
        {
            remove_n += 1;
        }
        if remove_n == 0 {
            return;
        }
        let step = remove_n + 1;
        let kept: Vec<IndexEntry> = self.entries.iter().step_by(step).copied().collect();
        self.entries = kept;
        self.est_block_uncomp *= step as i64;
    }

    /// Diagnostic dump; not part of the wire format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
