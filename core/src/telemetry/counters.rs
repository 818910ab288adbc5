//! telemetry/counters.rs
//! Mutable chunk and byte counters collected while a stream is written or read.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::constants::{CHECKSUM_SIZE, CHUNK_HEADER_SIZE};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCounters {
    pub chunks_compressed: u64,
    pub chunks_uncompressed: u64,
    pub chunks_padding: u64,
    pub chunks_index: u64,
    pub chunks_skipped: u64,
    /// Decoded bytes carried by data chunks.
    pub bytes_uncompressed: u64,
    /// Block payload bytes (compressed tokens or raw copies), excluding headers and checksums.
    pub bytes_payload: u64,
    /// Chunk headers, checksums, identifier, padding and index bytes.
    pub bytes_overhead: u64,
}

impl StreamCounters {
    pub fn add_identifier(&mut self, len: usize) {
        self.bytes_overhead += len as u64;
    }

    /// Record one data chunk of `payload_len` block bytes decoding to `raw_len` bytes.
    pub fn add_data(&mut self, compressed: bool, raw_len: usize, payload_len: usize) {
        if compressed {
            self.chunks_compressed += 1;
        } else {
            self.chunks_uncompressed += 1;
        }
        self.bytes_uncompressed += raw_len as u64;
        self.bytes_payload += payload_len as u64;
        self.bytes_overhead += (CHUNK_HEADER_SIZE + CHECKSUM_SIZE) as u64;
    }

    pub fn add_padding(&mut self, chunk_len: usize) {
        self.chunks_padding += 1;
        self.bytes_overhead += chunk_len as u64;
    }

    pub fn add_index(&mut self, chunk_len: usize) {
        self.chunks_index += 1;
        self.bytes_overhead += chunk_len as u64;
    }

    pub fn add_skipped(&mut self, chunk_len: usize) {
        self.chunks_skipped += 1;
        self.bytes_overhead += chunk_len as u64;
    }

    pub fn data_chunks(&self) -> u64 {
        self.chunks_compressed + self.chunks_uncompressed
    }

    /// Total encoded stream bytes accounted for.
    pub fn bytes_encoded(&self) -> u64 {
        self.bytes_payload + self.bytes_overhead
    }
}

impl AddAssign for StreamCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.chunks_compressed += rhs.chunks_compressed;
        self.chunks_uncompressed += rhs.chunks_uncompressed;
        self.chunks_padding += rhs.chunks_padding;
        self.chunks_index += rhs.chunks_index;
        self.chunks_skipped += rhs.chunks_skipped;
        self.bytes_uncompressed += rhs.bytes_uncompressed;
        self.bytes_payload += rhs.bytes_payload;
        self.bytes_overhead += rhs.bytes_overhead;
    }
}
