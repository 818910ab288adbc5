use crate::constants::{
    chunk_ids, CHECKSUM_SIZE, CHUNK_HEADER_SIZE, MAGIC_BODY, MAGIC_BODY_SNAPPY, MAX_CHUNK_SIZE,
};
use crate::stream::framing::types::{ChunkHeader, ChunkKind, ChunkType, FrameError};
use crate::utils::compute_checksum;

/// Identifier chunk for a new stream.
pub fn stream_identifier(snappy: bool) -> [u8; CHUNK_HEADER_SIZE + 6] {
    let magic = if snappy { MAGIC_BODY_SNAPPY } else { MAGIC_BODY };
    let mut out = [0u8; CHUNK_HEADER_SIZE + 6];
    out[0] = chunk_ids::STREAM_IDENTIFIER;
    out[1] = magic.len() as u8;
    out[CHUNK_HEADER_SIZE..].copy_from_slice(&magic);
    out
}

/// Append a data chunk for `raw`, using `encoded` as payload when present.
///
/// Layout:
///
/// ```text
/// [ type (1) ][ length (3) ][ masked crc32c of raw (4) ][ encoded block | raw bytes ]
/// ```
pub fn encode_data_chunk(
    out: &mut Vec<u8>,
    raw: &[u8],
    encoded: Option<&[u8]>,
) -> Result<usize, FrameError> {
    let (kind, body) = match encoded {
        Some(block) => (ChunkType::CompressedData, block),
        None => (ChunkType::UncompressedData, raw),
    };
    let header = ChunkHeader::new(ChunkKind::Known(kind), CHECKSUM_SIZE + body.len())?;
    out.reserve(CHUNK_HEADER_SIZE + header.len);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&compute_checksum(raw).to_le_bytes());
    out.extend_from_slice(body);
    Ok(CHUNK_HEADER_SIZE + header.len)
}

/// Padding needed after `written` bytes to reach the next multiple of `multiple`.
///
/// Returns 0 when already aligned, otherwise a value of at least `CHUNK_HEADER_SIZE`
/// (whole multiples are added until a chunk header fits).
pub fn padding_needed(written: u64, multiple: u64) -> usize {
    if multiple <= 1 {
        return 0;
    }
    let left = written % multiple;
    if left == 0 {
        return 0;
    }
    let mut add = multiple - left;
    while add < CHUNK_HEADER_SIZE as u64 {
        add += multiple;
    }
    add as usize
}

/// Append a padding chunk of `total` bytes (header included), filled from `fill`.
pub fn encode_padding_chunk(
    out: &mut Vec<u8>,
    total: usize,
    fill: impl FnOnce(&mut [u8]) -> std::io::Result<()>,
) -> Result<(), crate::types::StreamError> {
    if total < CHUNK_HEADER_SIZE || total - CHUNK_HEADER_SIZE > MAX_CHUNK_SIZE {
        return Err(FrameError::InvalidPadding(total).into());
    }
    let header = ChunkHeader::new(ChunkKind::Known(ChunkType::Padding), total - CHUNK_HEADER_SIZE)?;
    let start = out.len();
    out.extend_from_slice(&header.to_bytes());
    out.resize(start + total, 0);
    fill(&mut out[start + CHUNK_HEADER_SIZE..])?;
    Ok(())
}
