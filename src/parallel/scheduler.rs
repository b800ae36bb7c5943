//! Bounded worker pool for walker tasks

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::error::{Result, SmallifyError};

/// Fixed-size pool of OS threads.
///
/// Any number of tasks may be queued, but at most `workers` execute at once.
/// Queued tasks are plain path descriptions and hold no pixel data.
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(SmallifyError::config("Worker count must be greater than 0"));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("smallify-worker-{index}"))
            .build()?;

        info!("Initializing worker pool with {} threads", workers);

        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `op` inside a scope on the pool. Returns once every task spawned
    /// on the scope, including tasks spawned by other tasks, has finished.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}
