use crate::constants::{CHECKSUM_SIZE, CHUNK_HEADER_SIZE, MAGIC_BODY, MAGIC_BODY_SNAPPY};
use crate::stream::framing::types::{ChunkHeader, ChunkKind, FrameError};
use crate::utils::compute_checksum;

#[inline]
pub fn parse_chunk_header(wire: &[u8]) -> Result<ChunkHeader, FrameError> {
    if wire.len() < CHUNK_HEADER_SIZE {
        return Err(FrameError::Truncated);
    }
    let len = wire[1] as usize | (wire[2] as usize) << 8 | (wire[3] as usize) << 16;
    Ok(ChunkHeader {
        kind: ChunkKind::classify(wire[0]),
        len,
    })
}

/// Validate an identifier payload; returns true for a Snappy framed stream.
pub fn parse_stream_identifier(payload: &[u8]) -> Result<bool, FrameError> {
    if payload == MAGIC_BODY {
        Ok(false)
    } else if payload == MAGIC_BODY_SNAPPY {
        Ok(true)
    } else {
        Err(FrameError::InvalidMagic(payload.to_vec()))
    }
}

/// Split a data chunk payload into its stored checksum and body.
pub fn split_checksum(id: u8, payload: &[u8]) -> Result<(u32, &[u8]), FrameError> {
    if payload.len() < CHECKSUM_SIZE {
        return Err(FrameError::ShortChunk {
            id,
            len: payload.len(),
        });
    }
    let (crc, body) = payload.split_at(CHECKSUM_SIZE);
    Ok((u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]), body))
}

#[inline]
pub fn verify_checksum(expected: u32, data: &[u8]) -> Result<(), FrameError> {
    let actual = compute_checksum(data);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}
