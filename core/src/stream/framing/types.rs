use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::constants::{chunk_ids, CHUNK_HEADER_SIZE, MAX_CHUNK_SIZE};

/// Chunk types with defined meaning.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum ChunkType {
    CompressedData = 0x00,
    UncompressedData = 0x01,
    Index = 0x99,
    Padding = 0xfe,
    StreamIdentifier = 0xff,
}

/// How a reader must treat a chunk id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Known(ChunkType),
    /// Reserved 0x80..=0xfd: skip.
    Skippable(u8),
    /// Reserved 0x02..=0x7f: refuse.
    Unskippable(u8),
}

impl ChunkKind {
    pub fn classify(id: u8) -> Self {
        match ChunkType::try_from(id) {
            Ok(t) => ChunkKind::Known(t),
            Err(_) if chunk_ids::RESERVED_SKIPPABLE.contains(&id) => ChunkKind::Skippable(id),
            Err(_) => ChunkKind::Unskippable(id),
        }
    }

    pub fn id(&self) -> u8 {
        match *self {
            ChunkKind::Known(t) => t as u8,
            ChunkKind::Skippable(id) | ChunkKind::Unskippable(id) => id,
        }
    }

    /// Chunks a reader passes over without interpreting.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ChunkKind::Skippable(_) | ChunkKind::Known(ChunkType::Padding | ChunkType::Index)
        )
    }
}

/// `[ type (1) ][ length (3, LE) ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub kind: ChunkKind,
    pub len: usize,
}

impl ChunkHeader {
    pub const LEN: usize = CHUNK_HEADER_SIZE;

    pub fn new(kind: ChunkKind, len: usize) -> Result<Self, FrameError> {
        if len > MAX_CHUNK_SIZE {
            return Err(FrameError::ChunkTooLarge {
                len,
                max: MAX_CHUNK_SIZE,
            });
        }
        Ok(Self { kind, len })
    }

    pub fn to_bytes(&self) -> [u8; CHUNK_HEADER_SIZE] {
        let l = (self.len as u32).to_le_bytes();
        [self.kind.id(), l[0], l[1], l[2]]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("truncated chunk")]
    Truncated,
    #[error("chunk length {len} exceeds {max}")]
    ChunkTooLarge { len: usize, max: usize },
    #[error("invalid stream identifier {0:?}")]
    InvalidMagic(Vec<u8>),
    #[error("stream does not start with an identifier chunk")]
    MissingStreamIdentifier,
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("unsupported chunk type {0:#04x}")]
    UnsupportedChunk(u8),
    #[error("chunk type {id:#04x} too short: {len} bytes")]
    ShortChunk { id: u8, len: usize },
    #[error("block decodes to {len} bytes, limit {max}")]
    BlockTooLarge { len: usize, max: usize },
    #[error("padding size {0} cannot be expressed as a chunk")]
    InvalidPadding(usize),
}
