//! stream/seek.rs
//! Random access over a framed stream with a seekable source.
use std::io::{self, Read, Seek, SeekFrom};

use tracing::debug;

use crate::index::Index;
use crate::stream::reader::Reader;
use crate::types::StreamError;

/// Reader that supports `Seek`. With an index, any offset is reachable; without one, only
/// forward seeks (decoded and skipped) are possible.
pub struct ReadSeeker<R: Read + Seek> {
    reader: Reader<R>,
    index: Option<Index>,
}

impl<R: Read + Seek> ReadSeeker<R> {
    pub(crate) fn new(reader: Reader<R>, index: Option<Index>) -> Self {
        Self { reader, index }
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub fn reader(&self) -> &Reader<R> {
        &self.reader
    }

    pub fn into_inner(self) -> Reader<R> {
        self.reader
    }

    /// Move to decoded offset `pos`, returning the new position.
    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let r = &mut self.reader;
        if let Some(e) = &r.err {
            return Err(e.clone());
        }
        r.eof = false;

        let abs = match pos {
            SeekFrom::Start(off) => i64::try_from(off)
                .map_err(|_| StreamError::CantSeek("offset out of range".into()))?,
            SeekFrom::Current(off) => r.block_start + r.i as i64 + off,
            SeekFrom::End(off) => match &self.index {
                Some(ix) if ix.total_uncompressed >= 0 => ix.total_uncompressed + off,
                _ => return Err(StreamError::CantSeek("stream size unknown without an index".into())),
            },
        };
        if abs < 0 {
            return Err(StreamError::CantSeek("seek before start of stream".into()));
        }
        r.ensure_header()?;

        // Inside the current block: just move the cursor.
        if abs >= r.block_start && abs < r.block_start + r.j as i64 {
            r.i = (abs - r.block_start) as usize;
            return Ok(abs as u64);
        }

        let index = match &self.index {
            Some(ix) => ix,
            None => {
                let cur = r.block_start + r.i as i64;
                if abs < cur {
                    return Err(StreamError::CantSeek("backward seek needs an index".into()));
                }
                r.skip((abs - cur) as u64)?;
                return Ok(abs as u64);
            }
        };

        let (c, u) = index.find(abs)?;
        debug!(target_offset = abs, chunk = c, chunk_start = u, "seeking via index");
        r.src.seek(SeekFrom::Start(c as u64))?;
        r.i = 0;
        r.j = 0;
        r.block_start = u;
        r.read_header = true;
        if u < abs {
            r.skip((abs - u) as u64)?;
        }
        Ok(abs as u64)
    }
}

impl<R: Read + Seek> Read for ReadSeeker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: Read + Seek> Seek for ReadSeeker<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}
