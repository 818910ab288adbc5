//! stream/parallelism.rs
//! Worker count and in-flight block budget for the writer pipeline.

/// Parallelism configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub worker_count: usize,
    /// Blocks submitted but not yet written; submission blocks beyond this.
    pub inflight_blocks: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            worker_count: 1,
            inflight_blocks: 1,
        }
    }

    /// `concurrency` workers with room for two blocks each.
    pub fn with_concurrency(concurrency: usize) -> Self {
        let worker_count = concurrency.max(1);
        Self {
            worker_count,
            inflight_blocks: worker_count * 2,
        }
    }

    /// One worker per available core.
    pub fn dynamic() -> Self {
        Self::with_concurrency(num_cpus::get())
    }

    /// Concurrency 1 encodes on the calling thread.
    pub fn is_inline(&self) -> bool {
        self.worker_count <= 1
    }
}
