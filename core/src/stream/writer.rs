//! stream/writer.rs
//! Framed stream writer.
//!
//! Input is cut into blocks of the configured size. Blocks are compressed inline
//! (concurrency 1) or by a worker pool; finished chunks go through a reorder buffer so the
//! destination always sees them in input order. An index of chunk boundaries is kept for
//! every stream and optionally appended at close.
use std::io::{self, Read, Write};
use std::mem;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::compression::{create_compressor, Compressor};
use crate::index::Index;
use crate::stream::compression_worker::{encode_job, BlockJob, EncodedChunk, WorkerPool};
use crate::stream::config::{WriterConfig, WriterFlags};
use crate::stream::framing::encode::{encode_padding_chunk, padding_needed, stream_identifier};
use crate::stream::io::{read_full, ReorderBuffer};
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::{Stage, StreamCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

pub struct Writer<W: Write> {
    dst: W,
    cfg: WriterConfig,
    block_size: usize,
    compressor: Arc<dyn Compressor>,
    pool: Option<WorkerPool>,
    reorder: ReorderBuffer<EncodedChunk>,
    /// Input not yet cut into a block.
    pending: BytesMut,
    next_seq: u64,
    inflight: usize,
    wrote_identifier: bool,
    /// Encoded bytes written to `dst`.
    written: i64,
    /// Decoded bytes covered by written chunks.
    uncomp_written: i64,
    index: Index,
    /// Serialized index, set once the stream is closed.
    closed: Option<Vec<u8>>,
    err: Option<StreamError>,
    counters: StreamCounters,
    timer: TelemetryTimer,
}

impl<W: Write> Writer<W> {
    /// Writer with default configuration.
    pub fn new(dst: W) -> Result<Self, StreamError> {
        Self::with_config(dst, WriterConfig::default())
    }

    pub fn with_config(dst: W, cfg: WriterConfig) -> Result<Self, StreamError> {
        cfg.validate()?;
        let block_size = cfg.effective_block_size();
        let compressor = match &cfg.compressor {
            Some(c) => c.clone(),
            None => create_compressor(cfg.level, cfg.dialect(), cfg.dict.clone())?,
        };
        let profile = ParallelismProfile::with_concurrency(cfg.concurrency);
        let pool = if profile.is_inline() {
            None
        } else {
            Some(WorkerPool::spawn(profile, compressor.clone())?)
        };
        debug!(
            block_size,
            concurrency = cfg.concurrency,
            level = ?cfg.level,
            flags = ?cfg.flags,
            padding = cfg.padding,
            "stream writer created"
        );
        Ok(Self {
            dst,
            block_size,
            compressor,
            pool,
            reorder: ReorderBuffer::new(),
            pending: BytesMut::with_capacity(block_size),
            next_seq: 0,
            inflight: 0,
            wrote_identifier: false,
            written: 0,
            uncomp_written: 0,
            index: Index::new(block_size),
            closed: None,
            err: None,
            counters: StreamCounters::default(),
            timer: TelemetryTimer::new(),
            cfg,
        })
    }

    pub fn config(&self) -> &WriterConfig {
        &self.cfg
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn get_ref(&self) -> &W {
        &self.dst
    }

    /// Encoded bytes written to the destination so far.
    pub fn written(&self) -> u64 {
        self.written as u64
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(&self.counters, &self.timer)
    }

    fn check_open(&self) -> Result<(), StreamError> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        if self.closed.is_some() {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    /// Record the first failure; every later call reports it until `reset`.
    fn sticky<T>(&mut self, res: Result<T, StreamError>) -> Result<T, StreamError> {
        if let Err(e) = &res {
            if self.err.is_none() && !matches!(e, StreamError::Closed) {
                self.err = Some(e.clone());
            }
        }
        res
    }

    fn write_dst(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let start = std::time::Instant::now();
        self.dst.write_all(bytes)?;
        self.timer.add_stage_time(Stage::Write, start.elapsed());
        self.written += bytes.len() as i64;
        Ok(())
    }

    fn ensure_identifier(&mut self) -> Result<(), StreamError> {
        if self.wrote_identifier {
            return Ok(());
        }
        let id = stream_identifier(self.cfg.snappy());
        self.write_dst(&id)?;
        self.counters.add_identifier(id.len());
        self.wrote_identifier = true;
        debug!(snappy = self.cfg.snappy(), "stream identifier written");
        Ok(())
    }

    /// Write one finished chunk; callers guarantee sequence order.
    fn emit(&mut self, chunk: EncodedChunk) -> Result<(), StreamError> {
        self.ensure_identifier()?;
        self.index.add(self.uncomp_written, self.written)?;
        self.write_dst(&chunk.wire)?;
        self.uncomp_written += chunk.raw_len as i64;
        self.counters
            .add_data(chunk.compressed, chunk.raw_len, chunk.payload_len);
        self.timer.add_stage_time(Stage::Encode, chunk.encode_time);
        trace!(
            seq = chunk.seq,
            raw = chunk.raw_len,
            wire = chunk.wire.len(),
            compressed = chunk.compressed,
            "chunk written"
        );
        Ok(())
    }

    /// Take one result from the pool and write everything that became ready.
    fn collect_one(&mut self) -> Result<(), StreamError> {
        let res = match &self.pool {
            Some(pool) => pool.recv(),
            None => return Ok(()),
        };
        self.inflight -= 1;
        self.accept(res?)
    }

    fn accept(&mut self, chunk: EncodedChunk) -> Result<(), StreamError> {
        self.reorder.push(chunk.seq, chunk);
        while let Some(ready) = self.reorder.pop_ready() {
            self.emit(ready)?;
        }
        Ok(())
    }

    /// Hand one block to the encoder. Inline mode writes it before returning.
    fn submit(&mut self, data: Bytes) -> Result<(), StreamError> {
        let job = BlockJob {
            seq: self.next_seq,
            data,
        };
        self.next_seq += 1;
        let max_inflight = match &self.pool {
            None => {
                let chunk = encode_job(self.compressor.as_ref(), job)?;
                return self.accept(chunk);
            }
            Some(pool) => pool.max_inflight(),
        };
        while self.inflight >= max_inflight {
            self.collect_one()?;
        }
        if let Some(pool) = &self.pool {
            pool.submit(job)?;
        }
        self.inflight += 1;
        // Write whatever already finished without waiting.
        while let Some(res) = self.pool.as_ref().and_then(|p| p.try_recv()) {
            self.inflight -= 1;
            self.accept(res?)?;
        }
        Ok(())
    }

    /// Wait for every in-flight block and write it.
    fn drain(&mut self) -> Result<(), StreamError> {
        while self.inflight > 0 {
            self.collect_one()?;
        }
        Ok(())
    }

    fn write_data(&mut self, mut data: &[u8]) -> Result<(), StreamError> {
        self.check_open()?;
        while !data.is_empty() {
            let room = self.block_size - self.pending.len();
            let n = room.min(data.len());
            self.pending.extend_from_slice(&data[..n]);
            data = &data[n..];
            if self.pending.len() == self.block_size {
                let block = self.pending.split().freeze();
                self.submit(block)?;
            }
        }
        if self.cfg.flags.contains(WriterFlags::FLUSH_ON_WRITE) {
            self.flush_all()?;
        }
        Ok(())
    }

    fn flush_all(&mut self) -> Result<(), StreamError> {
        self.check_open()?;
        if !self.pending.is_empty() {
            let block = self.pending.split().freeze();
            self.submit(block)?;
        }
        self.drain()?;
        self.dst.flush()?;
        Ok(())
    }

    /// Encode a caller-owned buffer without copying it.
    ///
    /// Buffered input from earlier `write` calls is submitted first. With concurrency 1 the
    /// buffer is fully encoded and written before this returns and no reference to it is kept,
    /// so the caller can reclaim it (`Bytes::try_into_mut`). With more workers, block slices
    /// stay referenced until they are written; a later `flush` or `close` guarantees that.
    pub fn encode_buffer(&mut self, mut buf: Bytes) -> Result<(), StreamError> {
        let res: Result<(), StreamError> = (|| {
            self.check_open()?;
            if !self.pending.is_empty() {
                let block = self.pending.split().freeze();
                self.submit(block)?;
            }
            while !buf.is_empty() {
                let n = self.block_size.min(buf.len());
                let block = buf.split_to(n);
                self.submit(block)?;
            }
            if self.cfg.flags.contains(WriterFlags::FLUSH_ON_WRITE) {
                self.flush_all()?;
            }
            Ok(())
        })();
        self.sticky(res)
    }

    /// Copy everything from `src` through the writer, returning the number of bytes read.
    pub fn read_from<R: Read>(&mut self, mut src: R) -> Result<u64, StreamError> {
        let mut total = 0u64;
        let mut buf = vec![0u8; self.block_size];
        loop {
            let start = std::time::Instant::now();
            let n = match read_full(&mut src, &mut buf) {
                Ok(n) => n,
                Err(e) => return self.sticky(Err(e.into())),
            };
            self.timer.add_stage_time(Stage::Read, start.elapsed());
            if n == 0 {
                return Ok(total);
            }
            let res = self.write_data(&buf[..n]);
            self.sticky(res)?;
            total += n as u64;
        }
    }

    /// Flush, then finish the stream: padding, then the index when enabled.
    ///
    /// Calling again is a no-op.
    pub fn close(&mut self) -> Result<(), StreamError> {
        self.close_index().map(|_| ())
    }

    /// As `close`, returning the serialized index whether or not it was appended.
    ///
    /// After the first call the same bytes are returned without writing anything.
    pub fn close_index(&mut self) -> Result<Vec<u8>, StreamError> {
        if let Some(idx) = &self.closed {
            return Ok(idx.clone());
        }
        let res = self.finish();
        let idx = self.sticky(res)?;
        self.closed = Some(idx.clone());
        Ok(idx)
    }

    fn finish(&mut self) -> Result<Vec<u8>, StreamError> {
        self.flush_all()?;
        self.ensure_identifier()?;

        let append = self.cfg.flags.contains(WriterFlags::ADD_INDEX) && !self.cfg.snappy();
        let comp_total = if self.cfg.padding <= 1 { self.written } else { -1 };
        self.index.finalize(self.uncomp_written, comp_total);
        let index_bytes = self.index.save()?;

        // Padding is sized for the output including the index that follows it.
        let index_len = if append { index_bytes.len() as u64 } else { 0 };
        let pad = padding_needed(self.written as u64 + index_len, self.cfg.padding as u64);
        if pad > 0 {
            let mut chunk = Vec::with_capacity(pad);
            let source = self.cfg.padding_source.clone();
            encode_padding_chunk(&mut chunk, pad, |buf| source.fill(buf))?;
            self.write_dst(&chunk)?;
            self.counters.add_padding(pad);
        }
        if append {
            self.write_dst(&index_bytes)?;
            self.counters.add_index(index_bytes.len());
        }
        self.dst.flush()?;
        debug!(
            written = self.written,
            uncompressed = self.uncomp_written,
            padding = pad,
            index = index_len,
            entries = self.index.len(),
            "stream closed"
        );
        Ok(index_bytes)
    }

    /// Discard all state and continue with a new destination, returning the old one.
    ///
    /// Blocks still in flight are waited for and dropped.
    pub fn reset(&mut self, dst: W) -> W {
        while self.inflight > 0 {
            if let Some(pool) = &self.pool {
                let _ = pool.recv();
            }
            self.inflight -= 1;
        }
        self.reorder.reset();
        self.pending.clear();
        self.next_seq = 0;
        self.wrote_identifier = false;
        self.written = 0;
        self.uncomp_written = 0;
        self.index.reset(self.block_size);
        self.closed = None;
        self.err = None;
        self.counters = StreamCounters::default();
        self.timer = TelemetryTimer::new();
        debug!("stream writer reset");
        mem::replace(&mut self.dst, dst)
    }

    /// Close the stream and return the destination.
    pub fn into_inner(mut self) -> Result<W, StreamError> {
        self.close()?;
        self.pool.take();
        Ok(self.dst)
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res = self.write_data(buf);
        self.sticky(res)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed.is_some() && self.err.is_none() {
            return Ok(());
        }
        let res = self.flush_all();
        self.sticky(res)?;
        Ok(())
    }
}
