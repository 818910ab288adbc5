use std::time::Duration;

use bytes::Bytes;

/// One input block handed to a worker.
///
/// `data` is reference counted; the worker's handle is released as soon as the chunk is built.
#[derive(Debug, Clone)]
pub struct BlockJob {
    pub seq: u64,
    pub data: Bytes,
}

/// A finished data chunk ready to be written in sequence order.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    pub seq: u64,
    /// Complete chunk bytes: header, checksum and payload.
    pub wire: Vec<u8>,
    pub raw_len: usize,
    /// Block bytes after the checksum.
    pub payload_len: usize,
    pub compressed: bool,
    pub encode_time: Duration,
}
