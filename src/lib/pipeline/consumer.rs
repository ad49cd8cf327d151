//! The pull surface of a pipeline.
//!
//! [`RecordPipeline`] owns one pipeline instance: it starts the lexer and
//! dispatcher threads, and drains the Result Queue, blocking on each
//! [`PendingResult`] in submission order. It is not restartable; build a new
//! instance to read the same input again.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use seqflow_lib::fastq::{FastqLexer, fastq_transform};
//! use seqflow_lib::pipeline::{PipelineConfig, RecordPipeline, WorkerPool};
//!
//! let input = "@r1\nACGT\n+\nFFFF\n@r2\nGG\n+\nFF\n";
//! let lexer = FastqLexer::new(Box::new(Cursor::new(input.as_bytes().to_vec())), "reads.fq");
//! let pool = WorkerPool::new(2).unwrap();
//! let pipeline = RecordPipeline::flat(lexer, fastq_transform, &pool, PipelineConfig::new("reads")).unwrap();
//!
//! let ids: Vec<String> = pipeline.map(|r| r.unwrap().id).collect();
//! assert_eq!(ids, vec!["r1", "r2"]);
//! ```

use ahash::AHashMap;
use log::debug;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use super::config::{ErrorPolicy, PipelineConfig};
use super::dispatcher::{
    AggregateFn, Dispatch, TransformFn, run_flat, run_grouped, run_lexer, spawn_stage,
};
use super::lexer::{RawRecord, RecordLexer};
use super::pool::{PendingResult, WorkerPool};
use super::queue::{BoundedQueue, Popped, QueueControl, QueueStats};
use super::segmenter::Segment;
use super::state::{PipelineShared, PipelineState};
use crate::errors::{Result, SeqflowError};
use crate::logging::log_pipeline_summary;
use crate::progress::ProgressTracker;
use crate::record::Keyed;

/// Records collected before a read-all stopped on an error.
///
/// Lets callers tell "N records then an error" (non-empty `records`) from "no
/// records, error" (empty `records`). Clean exhaustion is the `Ok` case.
#[derive(Debug)]
pub struct PartialRead<C> {
    /// Everything successfully read.
    pub records: C,
    /// The first error encountered.
    pub error: SeqflowError,
    /// Total number of errors encountered, including `error`.
    pub error_count: u64,
}

impl<C> fmt::Display for PartialRead<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} error(s) in total)", self.error, self.error_count)
    }
}

impl<C: fmt::Debug> std::error::Error for PartialRead<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Accumulates the first error and a count while draining.
struct ErrorTally {
    first: Option<SeqflowError>,
    count: u64,
}

impl ErrorTally {
    fn new() -> Self {
        Self { first: None, count: 0 }
    }

    fn record(&mut self, error: SeqflowError) {
        debug!("Read-all skipping failed result: {error}");
        self.count += 1;
        self.first.get_or_insert(error);
    }

    fn finish<C>(self, records: C) -> std::result::Result<C, PartialRead<C>> {
        match self.first {
            None => Ok(records),
            Some(error) => Err(PartialRead { records, error, error_count: self.count }),
        }
    }
}

enum Step<T> {
    Pending(PendingResult<T>),
    Error(SeqflowError),
}

/// A running pipeline, consumed as an iterator of results in submission order.
///
/// Dropping it before exhaustion cancels outstanding work.
pub struct RecordPipeline<T> {
    name: String,
    results: Arc<BoundedQueue<PendingResult<T>>>,
    ingest: Arc<dyn QueueControl>,
    shared: Arc<PipelineShared>,
    threads: Vec<JoinHandle<()>>,
    progress: Arc<ProgressTracker>,
    peeked: Option<Step<T>>,
    finished: bool,
    delivered: u64,
    failed: u64,
    started: Instant,
}

impl<T: Send + 'static> RecordPipeline<T> {
    /// Starts a flat pipeline: one `transform` call per record, results in file order.
    ///
    /// # Errors
    ///
    /// Returns [`SeqflowError::InvalidParameter`] for an invalid `config`, or
    /// [`SeqflowError::Io`] if a stage thread cannot be spawned.
    pub fn flat<L, F>(lexer: L, transform: F, pool: &WorkerPool, config: PipelineConfig) -> Result<Self>
    where
        L: RecordLexer,
        F: Fn(RawRecord<L::Payload>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let transform: Arc<TransformFn<L::Payload, T>> = Arc::new(transform);
        Self::start(lexer, pool, &config, "records", move |ingest, dispatch| {
            run_flat(&ingest, &dispatch, &transform);
        })
    }

    /// Starts a segmented pipeline: one `aggregate` call per maximal run of
    /// consecutive records sharing a key.
    ///
    /// Results arrive in segment order, though callers should treat them as a set
    /// keyed by group key.
    ///
    /// # Errors
    ///
    /// Same as [`RecordPipeline::flat`].
    pub fn segmented<L, F>(
        lexer: L,
        aggregate: F,
        pool: &WorkerPool,
        config: PipelineConfig,
    ) -> Result<Self>
    where
        L: RecordLexer,
        F: Fn(Segment<L::Payload>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let aggregate: Arc<AggregateFn<L::Payload, T>> = Arc::new(aggregate);
        Self::start(lexer, pool, &config, "records", move |ingest, dispatch| {
            run_grouped(&ingest, &dispatch, &aggregate);
        })
    }

    fn start<L, D>(lexer: L, pool: &WorkerPool, config: &PipelineConfig, unit: &str, dispatcher: D) -> Result<Self>
    where
        L: RecordLexer,
        D: FnOnce(Arc<BoundedQueue<RawRecord<L::Payload>>>, Dispatch<T>) + Send + 'static,
    {
        config.validate()?;
        let name = config.name.clone();
        let shared = Arc::new(PipelineShared::new(config.error_policy));
        let ingest: Arc<BoundedQueue<RawRecord<L::Payload>>> =
            Arc::new(BoundedQueue::new(format!("{name}-ingest"), config.ingest_capacity));
        let results: Arc<BoundedQueue<PendingResult<T>>> =
            Arc::new(BoundedQueue::new(format!("{name}-results"), config.result_capacity));
        shared.register_queue(ingest.clone());
        shared.register_queue(results.clone());

        let progress = Arc::new(
            ProgressTracker::new(format!("[{name}] Dispatched"), unit)
                .with_interval(config.progress_interval),
        );
        let dispatch = Dispatch {
            pool: pool.clone(),
            results: Arc::clone(&results),
            shared: Arc::clone(&shared),
            progress: Arc::clone(&progress),
        };

        debug!(
            "Starting pipeline '{name}' (ingest capacity {}, result capacity {}, policy {}, {} workers)",
            config.ingest_capacity,
            config.result_capacity,
            config.error_policy,
            pool.num_threads()
        );

        let lexer_thread = {
            let ingest = Arc::clone(&ingest);
            let stage_shared = Arc::clone(&shared);
            spawn_stage(&name, "lexer", &shared, move || run_lexer(lexer, &ingest, &stage_shared))?
        };
        let dispatcher_thread = {
            let ingest = Arc::clone(&ingest);
            spawn_stage(&name, "dispatcher", &shared, move || dispatcher(ingest, dispatch))
        };
        let dispatcher_thread = match dispatcher_thread {
            Ok(handle) => handle,
            Err(e) => {
                shared.cancel();
                return Err(e);
            }
        };

        Ok(Self {
            name,
            results,
            ingest,
            shared,
            threads: vec![lexer_thread, dispatcher_thread],
            progress,
            peeked: None,
            finished: false,
            delivered: 0,
            failed: 0,
            started: Instant::now(),
        })
    }
}

impl<T> RecordPipeline<T> {
    /// True if another item (a value or an error) is available.
    ///
    /// Blocks until the next handle is queued or the stream ends.
    pub fn has_next(&mut self) -> bool {
        if self.peeked.is_some() {
            return true;
        }
        match self.advance() {
            Some(step) => {
                self.peeked = Some(step);
                true
            }
            None => false,
        }
    }

    /// Reads one result; `Ok(None)` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the error of the next unit, or the pipeline's terminal error.
    pub fn read(&mut self) -> Result<Option<T>> {
        self.next_result().transpose()
    }

    /// Drains everything into an ordered `Vec`.
    ///
    /// Transform errors are skipped and counted; a fatal error ends the stream.
    ///
    /// # Errors
    ///
    /// Returns [`PartialRead`] with everything read so far if any error occurred.
    pub fn read_all_ordered(mut self) -> std::result::Result<Vec<T>, PartialRead<Vec<T>>> {
        let mut records = Vec::new();
        let mut errors = ErrorTally::new();
        while let Some(outcome) = self.next_result() {
            match outcome {
                Ok(value) => records.push(value),
                Err(e) => errors.record(e),
            }
        }
        errors.finish(records)
    }

    /// Drains everything into a key → value map.
    ///
    /// A repeated key keeps the first value and is reported as
    /// [`SeqflowError::DuplicateKey`].
    ///
    /// # Errors
    ///
    /// Returns [`PartialRead`] with everything read so far if any error occurred.
    pub fn read_all(mut self) -> std::result::Result<AHashMap<String, T>, PartialRead<AHashMap<String, T>>>
    where
        T: Keyed,
    {
        let mut records: AHashMap<String, T> = AHashMap::new();
        let mut errors = ErrorTally::new();
        while let Some(outcome) = self.next_result() {
            match outcome {
                Ok(value) => match records.entry(value.key().to_string()) {
                    Entry::Occupied(entry) => {
                        errors.record(SeqflowError::DuplicateKey { key: entry.key().clone() });
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                },
                Err(e) => errors.record(e),
            }
        }
        errors.finish(records)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// Statistics of the Ingestion Queue and the Result Queue, in that order.
    #[must_use]
    pub fn queue_stats(&self) -> Vec<QueueStats> {
        vec![self.ingest.stats(), self.results.stats()]
    }

    /// Number of successful results returned so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn next_result(&mut self) -> Option<Result<T>> {
        loop {
            let outcome = match self.advance()? {
                Step::Pending(pending) => pending.wait(),
                Step::Error(e) => Err(e),
            };
            match outcome {
                Ok(value) => {
                    self.delivered += 1;
                    return Some(Ok(value));
                }
                Err(SeqflowError::Cancelled) if self.shared.is_cancelled() => {
                    if let Some(e) = self.shared.take_failure() {
                        self.failed += 1;
                        return Some(Err(e));
                    }
                }
                Err(e) => {
                    self.failed += 1;
                    if self.shared.policy() == ErrorPolicy::FailFast {
                        self.shared.mark_failed();
                        self.shared.cancel();
                    }
                    return Some(Err(e));
                }
            }
        }
    }

    fn advance(&mut self) -> Option<Step<T>> {
        if let Some(step) = self.peeked.take() {
            return Some(step);
        }
        if self.finished {
            return None;
        }
        if let Some(e) = self.shared.take_failure() {
            return Some(Step::Error(e));
        }
        match self.results.pop() {
            Popped::Item(pending) => Some(Step::Pending(pending)),
            Popped::Failed(e) => Some(Step::Error(e)),
            Popped::Exhausted => {
                if let Some(e) = self.shared.take_failure() {
                    return Some(Step::Error(e));
                }
                self.finish();
                None
            }
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.shared.mark_closed();
        if self.shared.is_cancelled() {
            // A cancelled lexer may still be parked on input; leave it detached.
            self.threads.clear();
        } else {
            for handle in self.threads.drain(..) {
                let _ = handle.join();
            }
        }
        self.progress.log_final();
        log_pipeline_summary(
            &self.name,
            self.delivered,
            self.failed,
            &self.queue_stats(),
            self.started.elapsed(),
        );
    }
}

impl<T> Iterator for RecordPipeline<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_result()
    }
}

impl<T> Drop for RecordPipeline<T> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Pipeline '{}' dropped before exhaustion; cancelling", self.name);
            self.shared.cancel();
        }
    }
}
