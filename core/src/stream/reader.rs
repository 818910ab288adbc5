//! stream/reader.rs
//! Framed stream reader.
//!
//! States: expecting the identifier, streaming, ended. Every data chunk is decoded and its
//! checksum verified before any of its bytes are returned. The first failure is sticky.
use std::io::{self, Read, Seek};
use std::mem;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::compression::{decode_into, decoded_len, max_encoded_len};
use crate::constants::{CHECKSUM_SIZE, CHUNK_HEADER_SIZE, MAGIC_BODY, MAX_SNAPPY_BLOCK_SIZE};
use crate::index::{Index, IndexError};
use crate::stream::config::ReaderConfig;
use crate::stream::framing::decode::{
    parse_chunk_header, parse_stream_identifier, split_checksum, verify_checksum,
};
use crate::stream::framing::{ChunkKind, ChunkType, FrameError};
use crate::stream::io::read_full;
use crate::stream::seek::ReadSeeker;
use crate::telemetry::{Stage, StreamCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

pub struct Reader<R: Read> {
    pub(crate) src: R,
    cfg: ReaderConfig,
    /// Decoded block; bytes `i..j` are still unread.
    decoded: Vec<u8>,
    pub(crate) i: usize,
    pub(crate) j: usize,
    payload: Vec<u8>,
    pub(crate) read_header: bool,
    max_block: usize,
    /// Stream offset of `decoded[0]`.
    pub(crate) block_start: i64,
    pub(crate) eof: bool,
    pub(crate) err: Option<StreamError>,
    counters: StreamCounters,
    timer: TelemetryTimer,
}

impl<R: Read> Reader<R> {
    pub fn new(src: R) -> Self {
        Self::with_config(src, ReaderConfig::default())
    }

    pub fn with_config(src: R, cfg: ReaderConfig) -> Self {
        Self {
            src,
            max_block: cfg.max_block_size,
            read_header: cfg.ignore_stream_identifier,
            cfg,
            decoded: Vec::new(),
            i: 0,
            j: 0,
            payload: Vec::new(),
            block_start: 0,
            eof: false,
            err: None,
            counters: StreamCounters::default(),
            timer: TelemetryTimer::new(),
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.cfg
    }

    pub fn get_ref(&self) -> &R {
        &self.src
    }

    pub fn into_inner(self) -> R {
        self.src
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(&self.counters, &self.timer)
    }

    /// The sticky error, if decoding has failed.
    pub fn last_error(&self) -> Option<&StreamError> {
        self.err.as_ref()
    }

    /// Decoded stream offset of the next byte `read` returns.
    pub fn position(&self) -> i64 {
        self.block_start + self.i as i64
    }

    /// Continue with a new source, returning the old one. Configuration is kept.
    pub fn reset(&mut self, src: R) -> R {
        self.i = 0;
        self.j = 0;
        self.block_start = 0;
        self.read_header = self.cfg.ignore_stream_identifier;
        self.max_block = self.cfg.max_block_size;
        self.eof = false;
        self.err = None;
        self.counters = StreamCounters::default();
        self.timer = TelemetryTimer::new();
        mem::replace(&mut self.src, src)
    }

    fn fail(&mut self, e: StreamError) -> StreamError {
        if self.err.is_none() {
            warn!(error = %e, offset = self.position(), "stream decode failed");
            self.err = Some(e.clone());
        }
        e
    }

    fn read_payload(&mut self, len: usize) -> Result<(), StreamError> {
        self.payload.resize(len, 0);
        let start = Instant::now();
        let n = read_full(&mut self.src, &mut self.payload)?;
        self.timer.add_stage_time(Stage::Read, start.elapsed());
        if n != len {
            return Err(FrameError::Truncated.into());
        }
        Ok(())
    }

    fn skip_payload(&mut self, len: usize) -> Result<(), StreamError> {
        let copied = io::copy(&mut (&mut self.src).take(len as u64), &mut io::sink())?;
        if copied != len as u64 {
            return Err(FrameError::Truncated.into());
        }
        Ok(())
    }

    /// Decode the next data chunk into the block buffer.
    ///
    /// Returns false at a clean end of stream (end of input on a chunk boundary).
    pub(crate) fn fill(&mut self) -> Result<bool, StreamError> {
        loop {
            let mut hdr = [0u8; CHUNK_HEADER_SIZE];
            match read_full(&mut self.src, &mut hdr)? {
                0 => return Ok(false),
                CHUNK_HEADER_SIZE => {}
                _ => return Err(FrameError::Truncated.into()),
            }
            let header = parse_chunk_header(&hdr)?;
            let id = header.kind.id();
            if !self.read_header && header.kind != ChunkKind::Known(ChunkType::StreamIdentifier) {
                return Err(FrameError::MissingStreamIdentifier.into());
            }

            match header.kind {
                ChunkKind::Known(ChunkType::StreamIdentifier) => {
                    if header.len != MAGIC_BODY.len() {
                        return Err(FrameError::InvalidMagic(Vec::new()).into());
                    }
                    self.read_payload(header.len)?;
                    let snappy = parse_stream_identifier(&self.payload)?;
                    self.max_block = if snappy {
                        self.cfg.max_block_size.min(MAX_SNAPPY_BLOCK_SIZE)
                    } else {
                        self.cfg.max_block_size
                    };
                    self.read_header = true;
                    self.counters.add_identifier(CHUNK_HEADER_SIZE + header.len);
                    debug!(snappy, "stream identifier read");
                }
                ChunkKind::Known(kind @ (ChunkType::CompressedData | ChunkType::UncompressedData)) => {
                    let compressed = kind == ChunkType::CompressedData;
                    let body_limit = if compressed {
                        max_encoded_len(self.max_block).unwrap_or(usize::MAX)
                    } else {
                        self.max_block
                    };
                    let limit = body_limit.saturating_add(CHECKSUM_SIZE);
                    if header.len > limit {
                        return Err(FrameError::ChunkTooLarge {
                            len: header.len,
                            max: limit,
                        }
                        .into());
                    }
                    self.read_payload(header.len)?;
                    let (crc, body) = split_checksum(id, &self.payload)?;
                    let n = if compressed {
                        decoded_len(body)?
                    } else {
                        body.len()
                    };
                    if n > self.max_block {
                        return Err(FrameError::BlockTooLarge {
                            len: n,
                            max: self.max_block,
                        }
                        .into());
                    }
                    self.decoded.resize(n, 0);
                    let start = Instant::now();
                    if compressed {
                        decode_into(&mut self.decoded, body, self.cfg.dict.as_deref())?;
                    } else {
                        self.decoded[..n].copy_from_slice(body);
                    }
                    self.timer.add_stage_time(Stage::Decode, start.elapsed());
                    verify_checksum(crc, &self.decoded[..n])?;

                    self.counters.add_data(compressed, n, body.len());
                    trace!(compressed, len = n, at = self.block_start + self.j as i64, "block decoded");
                    self.block_start += self.j as i64;
                    self.i = 0;
                    self.j = n;
                    if n > 0 {
                        return Ok(true);
                    }
                }
                ChunkKind::Unskippable(_) => {
                    return Err(FrameError::UnsupportedChunk(id).into());
                }
                kind => {
                    self.skip_payload(header.len)?;
                    let len = CHUNK_HEADER_SIZE + header.len;
                    match kind {
                        ChunkKind::Known(ChunkType::Padding) => self.counters.add_padding(len),
                        ChunkKind::Known(ChunkType::Index) => self.counters.add_index(len),
                        _ => self.counters.add_skipped(len),
                    }
                    trace!(id, len, "chunk skipped");
                }
            }
        }
    }

    /// Make sure the identifier has been consumed (reads the first block as a side effect).
    pub(crate) fn ensure_header(&mut self) -> Result<(), StreamError> {
        if self.read_header || self.i < self.j || self.eof {
            return Ok(());
        }
        match self.fill() {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.eof = true;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.i < self.j {
                let n = (self.j - self.i).min(buf.len());
                buf[..n].copy_from_slice(&self.decoded[self.i..self.i + n]);
                self.i += n;
                return Ok(n);
            }
            if self.eof {
                return Ok(0);
            }
            match self.fill() {
                Ok(true) => continue,
                Ok(false) => {
                    self.eof = true;
                    return Ok(0);
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    /// Advance the decoded position by `n` bytes. Every crossed chunk is still decoded and
    /// checksum verified. Skipping past the end is an error.
    pub fn skip(&mut self, mut n: u64) -> Result<(), StreamError> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        loop {
            let avail = (self.j - self.i) as u64;
            if avail >= n {
                self.i += n as usize;
                return Ok(());
            }
            n -= avail;
            self.i = self.j;
            match self.fill() {
                Ok(true) => continue,
                Ok(false) => {
                    self.eof = true;
                    return Err(self.fail(FrameError::Truncated.into()));
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }
}

impl<R: Read + Seek> Reader<R> {
    /// Wrap into a seekable reader.
    ///
    /// A supplied `index` is used as is. Otherwise the index is loaded from the end of the
    /// source. Without one, `random` refuses; otherwise only forward seeks are possible.
    pub fn read_seeker(mut self, random: bool, index: Option<Index>) -> Result<ReadSeeker<R>, StreamError> {
        if index.is_some() {
            return Ok(ReadSeeker::new(self, index));
        }
        let pos = self.src.stream_position()?;
        let mut loaded = Index::default();
        let res = loaded.load_stream(&mut self.src);
        self.src.seek(io::SeekFrom::Start(pos))?;
        match res {
            Ok(()) => Ok(ReadSeeker::new(self, Some(loaded))),
            Err(StreamError::Index(IndexError::Unsupported)) if !random => {
                debug!("no stream index, forward seeking only");
                Ok(ReadSeeker::new(self, None))
            }
            Err(StreamError::Index(IndexError::Unsupported)) => {
                Err(StreamError::CantSeek("stream does not contain an index".into()))
            }
            Err(e) => Err(StreamError::CantSeek(format!("reading index: {e}"))),
        }
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_data(buf)?)
    }
}
