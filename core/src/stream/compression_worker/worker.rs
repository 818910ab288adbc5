use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use tracing::{debug, trace};

use crate::compression::{Compressor, Encoded};
use crate::constants::{CHECKSUM_SIZE, CHUNK_HEADER_SIZE};
use crate::stream::compression_worker::types::{BlockJob, EncodedChunk};
use crate::stream::framing::encode::encode_data_chunk;
use crate::stream::parallelism::ParallelismProfile;
use crate::types::StreamError;

/// Compress one block and frame it. Blocks that do not shrink are stored raw.
pub fn encode_job(compressor: &dyn Compressor, job: BlockJob) -> Result<EncodedChunk, StreamError> {
    let start = Instant::now();
    let mut block = Vec::new();
    let outcome = compressor.compress_block(&job.data, &mut block)?;
    let encoded = match outcome {
        Encoded::Compressed(n) if n == block.len() => Some(block.as_slice()),
        Encoded::Compressed(_) => {
            return Err(StreamError::PipelineError(
                "compressor reported a length different from its output",
            ))
        }
        Encoded::Literal => None,
    };
    let mut wire = Vec::with_capacity(CHUNK_HEADER_SIZE + CHECKSUM_SIZE + job.data.len());
    let n = encode_data_chunk(&mut wire, &job.data, encoded)?;
    Ok(EncodedChunk {
        seq: job.seq,
        payload_len: n - CHUNK_HEADER_SIZE - CHECKSUM_SIZE,
        wire,
        raw_len: job.data.len(),
        compressed: encoded.is_some(),
        encode_time: start.elapsed(),
    })
}

/// Single worker loop: runs until the job queue is closed.
pub fn run_block_worker(
    rx: Receiver<BlockJob>,
    tx: Sender<Result<EncodedChunk, StreamError>>,
    compressor: Arc<dyn Compressor>,
) {
    while let Ok(job) = rx.recv() {
        let seq = job.seq;
        let res = encode_job(compressor.as_ref(), job);
        trace!(seq, ok = res.is_ok(), "block encoded");
        if tx.send(res).is_err() {
            break;
        }
    }
}

/// Fixed pool of block workers behind bounded queues.
pub struct WorkerPool {
    job_tx: Option<Sender<BlockJob>>,
    result_rx: Receiver<Result<EncodedChunk, StreamError>>,
    handles: Vec<JoinHandle<()>>,
    profile: ParallelismProfile,
}

impl WorkerPool {
    pub fn spawn(profile: ParallelismProfile, compressor: Arc<dyn Compressor>) -> Result<Self, StreamError> {
        // Results never exceed the in-flight budget, so workers never block on send.
        let (job_tx, job_rx) = bounded::<BlockJob>(profile.inflight_blocks);
        let (result_tx, result_rx) = bounded(profile.inflight_blocks);
        let mut handles = Vec::with_capacity(profile.worker_count);
        for i in 0..profile.worker_count {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            let c = compressor.clone();
            let handle = thread::Builder::new()
                .name(format!("s2-block-{i}"))
                .spawn(move || run_block_worker(rx, tx, c))?;
            handles.push(handle);
        }
        debug!(
            workers = profile.worker_count,
            inflight = profile.inflight_blocks,
            compressor = compressor.name(),
            "block worker pool started"
        );
        Ok(Self {
            job_tx: Some(job_tx),
            result_rx,
            handles,
            profile,
        })
    }

    pub fn max_inflight(&self) -> usize {
        self.profile.inflight_blocks
    }

    /// Enqueue a block. Blocks while the job queue is full.
    pub fn submit(&self, job: BlockJob) -> Result<(), StreamError> {
        self.job_tx
            .as_ref()
            .ok_or(StreamError::PipelineError("worker pool shut down"))?
            .send(job)
            .map_err(|_| StreamError::PipelineError("block workers exited"))
    }

    /// Wait for the next finished block (any order).
    pub fn recv(&self) -> Result<EncodedChunk, StreamError> {
        self.result_rx
            .recv()
            .map_err(|_| StreamError::PipelineError("block workers exited"))?
    }

    /// A finished block, if one is ready.
    pub fn try_recv(&self) -> Option<Result<EncodedChunk, StreamError>> {
        match self.result_rx.try_recv() {
            Ok(res) => Some(res),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(StreamError::PipelineError("block workers exited")))
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.job_tx.take();
        // Unblock workers waiting to deliver results nobody will read.
        while self.result_rx.try_recv().is_ok() {}
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
        debug!("block worker pool stopped");
    }
}
