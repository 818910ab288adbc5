use std::io::{Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::compression::decoded_len;
use crate::constants::{
    index_markers::{HEADER, MAX_ENTRIES, TRAILER},
    CHECKSUM_SIZE, CHUNK_HEADER_SIZE, MAX_BLOCK_SIZE, MAX_CHUNK_SIZE,
};
use crate::index::types::{Index, IndexEntry, IndexError};
use crate::stream::framing::decode::{parse_chunk_header, parse_stream_identifier};
use crate::stream::framing::{ChunkKind, ChunkType, FrameError};
use crate::stream::io::read_full;
use crate::types::StreamError;
use crate::utils::read_varint;

/// Sequential reader over the index body.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn varint(&mut self) -> Result<i64, IndexError> {
        let (v, n) = read_varint(&self.buf[self.pos..]).ok_or(IndexError::Corrupt("varint"))?;
        self.pos += n;
        Ok(v)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], IndexError> {
        let out = self
            .buf
            .get(self.pos..self.pos + n)
            .ok_or(IndexError::UnexpectedEof)?;
        self.pos += n;
        Ok(out)
    }
}

impl Index {
    /// Parse an index chunk from the front of `b`, replacing the current contents.
    ///
    /// Returns the number of bytes consumed.
    pub fn load(&mut self, b: &[u8]) -> Result<usize, IndexError> {
        if b.len() <= CHUNK_HEADER_SIZE + HEADER.len() + TRAILER.len() {
            return Err(IndexError::UnexpectedEof);
        }
        let header = parse_chunk_header(b).map_err(|_| IndexError::UnexpectedEof)?;
        if header.kind != ChunkKind::Known(ChunkType::Index) {
            return Err(IndexError::Unsupported);
        }
        if b.len() < CHUNK_HEADER_SIZE + header.len {
            return Err(IndexError::UnexpectedEof);
        }
        let mut c = Cursor {
            buf: &b[..CHUNK_HEADER_SIZE + header.len],
            pos: CHUNK_HEADER_SIZE,
        };
        if c.take(HEADER.len())? != HEADER {
            return Err(IndexError::Unsupported);
        }

        let total_uncompressed = c.varint()?;
        if total_uncompressed < -1 {
            return Err(IndexError::Corrupt("total uncompressed size"));
        }
        let total_compressed = c.varint()?;
        if total_compressed < -1 {
            return Err(IndexError::Corrupt("total compressed size"));
        }
        let est = c.varint()?;
        if est < 0 {
            return Err(IndexError::Corrupt("block size estimate"));
        }
        let count = c.varint()?;
        if count < 0 {
            return Err(IndexError::Corrupt("entry count"));
        }
        if count as u64 > MAX_ENTRIES as u64 {
            return Err(IndexError::TooManyEntries(count as usize));
        }
        let count = count as usize;
        let has_uncompressed = c.take(1)?[0];
        if has_uncompressed > 1 {
            return Err(IndexError::Corrupt("offset flag"));
        }

        let mut entries = vec![
            IndexEntry {
                compressed: 0,
                uncompressed: 0,
            };
            count
        ];
        for idx in 0..count {
            let mut u = if has_uncompressed == 1 { c.varint()? } else { 0 };
            if idx > 0 {
                let prev = entries[idx - 1].uncompressed;
                u = u
                    .checked_add(prev + est)
                    .ok_or(IndexError::Corrupt("uncompressed offset"))?;
                if u <= prev {
                    return Err(IndexError::Corrupt("uncompressed offsets not increasing"));
                }
            }
            if u < 0 {
                return Err(IndexError::Corrupt("negative uncompressed offset"));
            }
            entries[idx].uncompressed = u;
        }

        let mut predict = est / 2;
        for idx in 0..count {
            let mut off = c.varint()?;
            if idx > 0 {
                let next_predict = predict + off / 2;
                let prev = entries[idx - 1].compressed;
                off = off
                    .checked_add(prev + predict)
                    .ok_or(IndexError::Corrupt("compressed offset"))?;
                if off <= prev {
                    return Err(IndexError::Corrupt("compressed offsets not increasing"));
                }
                predict = next_predict;
            }
            if off < 0 {
                return Err(IndexError::Corrupt("negative compressed offset"));
            }
            entries[idx].compressed = off;
        }

        let size = LittleEndian::read_u32(c.take(4)?) as usize;
        if c.take(TRAILER.len())? != TRAILER {
            return Err(IndexError::Corrupt("trailer"));
        }
        if size != c.pos {
            return Err(IndexError::Corrupt("size field"));
        }

        self.total_uncompressed = total_uncompressed;
        self.total_compressed = total_compressed;
        self.est_block_uncomp = est;
        self.entries = entries;
        Ok(c.pos)
    }

    /// Load an index appended as the last chunk of a seekable stream.
    ///
    /// The stream position is left unspecified.
    pub fn load_stream<R: Read + Seek>(&mut self, rs: &mut R) -> Result<(), StreamError> {
        let tail_len = (4 + TRAILER.len()) as u64;
        let end = rs.seek(SeekFrom::End(0))?;
        if end < tail_len {
            return Err(IndexError::Unsupported.into());
        }
        rs.seek(SeekFrom::Start(end - tail_len))?;
        let mut tail = [0u8; 10];
        rs.read_exact(&mut tail)?;
        if tail[4..] != TRAILER {
            return Err(IndexError::Unsupported.into());
        }
        let size = LittleEndian::read_u32(&tail[..4]) as u64;
        if size > (MAX_CHUNK_SIZE + CHUNK_HEADER_SIZE) as u64 || size > end {
            return Err(IndexError::Corrupt("size field").into());
        }
        rs.seek(SeekFrom::Start(end - size))?;
        let mut buf = vec![0u8; size as usize];
        rs.read_exact(&mut buf)?;
        self.load(&buf)?;
        debug!(entries = self.entries.len(), size, "loaded stream index");
        Ok(())
    }

    /// Build an index by walking the chunks of a complete stream.
    ///
    /// Block contents are not decoded; only their declared lengths are read.
    pub fn from_stream<R: Read>(mut r: R) -> Result<Index, StreamError> {
        let mut index = Index::new(0);
        let mut total_u: i64 = 0;
        let mut total_c: i64 = 0;
        let mut seen_identifier = false;
        let mut buf = Vec::new();
        loop {
            let mut hdr = [0u8; CHUNK_HEADER_SIZE];
            match read_full(&mut r, &mut hdr)? {
                0 => break,
                CHUNK_HEADER_SIZE => {}
                _ => return Err(FrameError::Truncated.into()),
            }
            let header = parse_chunk_header(&hdr)?;
            let start = total_c;
            total_c += (CHUNK_HEADER_SIZE + header.len) as i64;

            if !seen_identifier && header.kind != ChunkKind::Known(ChunkType::StreamIdentifier) {
                return Err(FrameError::MissingStreamIdentifier.into());
            }
            if let ChunkKind::Unskippable(id) = header.kind {
                return Err(FrameError::UnsupportedChunk(id).into());
            }

            buf.resize(header.len, 0);
            if read_full(&mut r, &mut buf)? != header.len {
                return Err(FrameError::Truncated.into());
            }

            let block_len = match header.kind {
                ChunkKind::Known(ChunkType::StreamIdentifier) => {
                    parse_stream_identifier(&buf)?;
                    seen_identifier = true;
                    continue;
                }
                ChunkKind::Known(ChunkType::CompressedData) => {
                    if header.len < CHECKSUM_SIZE {
                        return Err(FrameError::ShortChunk { id: 0, len: header.len }.into());
                    }
                    decoded_len(&buf[CHECKSUM_SIZE..])?
                }
                ChunkKind::Known(ChunkType::UncompressedData) => {
                    if header.len < CHECKSUM_SIZE {
                        return Err(FrameError::ShortChunk { id: 1, len: header.len }.into());
                    }
                    header.len - CHECKSUM_SIZE
                }
                _ => continue,
            };
            if block_len > MAX_BLOCK_SIZE {
                return Err(FrameError::BlockTooLarge {
                    len: block_len,
                    max: MAX_BLOCK_SIZE,
                }
                .into());
            }
            if block_len == 0 {
                continue;
            }
            if index.est_block_uncomp == 0 {
                index.est_block_uncomp = block_len as i64;
            }
            index.add(total_u, start)?;
            total_u += block_len as i64;
        }
        index.finalize(total_u, total_c);
        Ok(index)
    }
}
