//! Block compression workers for the stream writer.
//!
//! Responsibilities:
//! - Turn one input block into a finished data chunk (checksum, header, payload)
//! - Run a fixed pool of threads fed by a bounded queue
//!
//! Non-responsibilities:
//! - Ordering (see `stream::io::ReorderBuffer`)
//! - Destination I/O

pub mod types;
pub mod worker;

pub use types::{BlockJob, EncodedChunk};
pub use worker::{encode_job, run_block_worker, WorkerPool};
