//! Shared worker pool and per-task result handles.
//!
//! Transforms run on a fixed-size rayon pool. One pool may be shared by any number
//! of pipelines, so a reference-genome load and a consensus run draw from the same
//! threads. Each submitted task gets a [`PendingResult`], a one-shot channel that
//! the consumer blocks on in submission order.

use crossbeam_channel::{Receiver, bounded};
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::errors::{Result, SeqflowError};
use crate::validation::validate_positive;

/// Fixed-size pool of transform workers. Cloning shares the same threads.
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("threads", &self.num_threads()).finish()
    }
}

impl WorkerPool {
    /// Creates a pool with `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`SeqflowError::InvalidParameter`] when `threads` is zero or the
    /// threads cannot be spawned.
    pub fn new(threads: usize) -> Result<Self> {
        validate_positive(threads, "threads")?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("seqflow-worker-{i}"))
            .build()
            .map_err(|e| SeqflowError::InvalidParameter {
                parameter: "threads".to_string(),
                reason: format!("failed to start worker pool: {e}"),
            })?;
        debug!("Started worker pool with {threads} threads");
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Schedules `task` and returns a handle to its outcome.
    ///
    /// Tasks start in submission order (FIFO), though they may finish in any order.
    /// A panicking task resolves to [`SeqflowError::WorkerPanicked`].
    pub fn submit<T, F>(&self, ordinal: u64, key: String, task: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.pool.spawn_fifo(move || {
            let outcome = catch_unwind(AssertUnwindSafe(task))
                .unwrap_or_else(|_| Err(SeqflowError::WorkerPanicked { stage: "transform".to_string() }));
            // The consumer may have gone away; nobody is left to tell.
            let _ = tx.send(outcome);
        });
        PendingResult { ordinal, key, receiver: rx }
    }
}

/// Outcome of one submitted unit of work, awaited by the consumer.
#[derive(Debug)]
pub struct PendingResult<T> {
    ordinal: u64,
    key: String,
    receiver: Receiver<Result<T>>,
}

impl<T> PendingResult<T> {
    /// Submission-order index.
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Record id or group key of the unit.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once the outcome is available without blocking.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Blocks until the task finishes.
    ///
    /// # Errors
    ///
    /// Returns the task's error, or [`SeqflowError::Cancelled`] if the task was
    /// dropped without running.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().unwrap_or(Err(SeqflowError::Cancelled))
    }
}
