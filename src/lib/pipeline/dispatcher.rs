//! Stage threads: the lexer loop and the two dispatcher loops.
//!
//! Each loop runs on its own named thread, created by
//! [`RecordPipeline`](super::consumer::RecordPipeline). They never return errors;
//! terminal conditions are forwarded downstream through the queues
//! ([`BoundedQueue::fail`]) or through the shared failure slot
//! ([`PipelineShared::abort_with`]).

use log::{debug, error, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::config::ErrorPolicy;
use super::lexer::{RawRecord, RecordLexer};
use super::pool::{PendingResult, WorkerPool};
use super::queue::{BoundedQueue, Popped};
use super::segmenter::{Segment, Segmenter};
use super::state::PipelineShared;
use crate::errors::{Result, SeqflowError};
use crate::progress::ProgressTracker;

/// Per-record transform supplied by the caller.
pub type TransformFn<P, T> = dyn Fn(RawRecord<P>) -> anyhow::Result<T> + Send + Sync;

/// Per-segment aggregate supplied by the caller.
pub type AggregateFn<P, T> = dyn Fn(Segment<P>) -> anyhow::Result<T> + Send + Sync;

/// Spawns a stage thread whose panic fails the pipeline instead of hanging the consumer.
pub(crate) fn spawn_stage<F>(
    pipeline: &str,
    stage: &'static str,
    shared: &Arc<PipelineShared>,
    body: F,
) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name(format!("seqflow-{pipeline}-{stage}"))
        .spawn(move || {
            if catch_unwind(AssertUnwindSafe(body)).is_err() {
                error!("Pipeline {stage} thread panicked");
                shared.abort_with(SeqflowError::WorkerPanicked { stage: stage.to_string() });
            }
        })
        .map_err(|e| SeqflowError::Io { path: format!("<{stage} thread>"), source: e })
}

/// Drives the lexer until end of input, an error, or cancellation.
pub(crate) fn run_lexer<L: RecordLexer>(
    mut lexer: L,
    ingest: &BoundedQueue<RawRecord<L::Payload>>,
    shared: &PipelineShared,
) {
    loop {
        if shared.is_cancelled() {
            debug!("Lexer for '{}' stopping: pipeline cancelled", lexer.source_name());
            return;
        }
        match lexer.next_record() {
            Ok(Some(record)) => match ingest.push(record) {
                Ok(()) => {}
                Err(SeqflowError::Cancelled) => return,
                Err(e) => {
                    error!("Lexer for '{}' could not enqueue: {e}", lexer.source_name());
                    shared.abort_with(e);
                    return;
                }
            },
            Ok(None) => {
                debug!("Lexer reached end of '{}'", lexer.source_name());
                shared.begin_draining();
                ingest.close();
                return;
            }
            Err(e) => {
                warn!("{e}");
                match shared.policy() {
                    ErrorPolicy::Isolate => {
                        shared.mark_failed();
                        ingest.fail(e);
                    }
                    ErrorPolicy::FailFast => shared.abort_with(e),
                }
                return;
            }
        }
    }
}

/// Dispatcher state shared by the flat and grouped loops.
pub(crate) struct Dispatch<T> {
    pub(crate) pool: WorkerPool,
    pub(crate) results: Arc<BoundedQueue<PendingResult<T>>>,
    pub(crate) shared: Arc<PipelineShared>,
    pub(crate) progress: Arc<ProgressTracker>,
}

impl<T: Send + 'static> Dispatch<T> {
    /// Submits one unit and enqueues its handle. Returns `false` once the consumer
    /// side is gone and dispatch should stop.
    fn submit<U, F>(&self, ordinal: u64, key: String, unit: U, transform: &Arc<F>) -> bool
    where
        U: Send + 'static,
        F: Fn(U) -> anyhow::Result<T> + Send + Sync + ?Sized + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let transform = Arc::clone(transform);
        let task_key = key.clone();
        let pending = self.pool.submit(ordinal, key, move || {
            if shared.is_cancelled() {
                return Err(SeqflowError::Cancelled);
            }
            transform(unit).map_err(|source| {
                shared.on_transform_error(SeqflowError::Transform { key: task_key, ordinal, source })
            })
        });
        match self.results.push(pending) {
            Ok(()) => true,
            Err(SeqflowError::Cancelled) => false,
            Err(e) => {
                error!("Dispatcher could not enqueue result: {e}");
                self.shared.abort_with(e);
                false
            }
        }
    }

    /// Ends the result stream after the ingestion queue is exhausted.
    fn finish(&self) {
        if !self.shared.is_cancelled() {
            self.results.close();
        }
    }
}

/// Flat mode: one task per raw record.
pub(crate) fn run_flat<P, T>(
    ingest: &BoundedQueue<RawRecord<P>>,
    dispatch: &Dispatch<T>,
    transform: &Arc<TransformFn<P, T>>,
) where
    P: Send + 'static,
    T: Send + 'static,
{
    let mut ordinal = 0u64;
    loop {
        match ingest.pop() {
            Popped::Item(record) => {
                let key = record.key.clone();
                if !dispatch.submit(ordinal, key, record, transform) {
                    return;
                }
                ordinal += 1;
                dispatch.progress.log_if_needed(1);
            }
            Popped::Failed(e) => {
                dispatch.results.fail(e);
                return;
            }
            Popped::Exhausted => {
                dispatch.finish();
                return;
            }
        }
    }
}

/// Grouped mode: records are folded into segments, one task per segment.
pub(crate) fn run_grouped<P, T>(
    ingest: &BoundedQueue<RawRecord<P>>,
    dispatch: &Dispatch<T>,
    aggregate: &Arc<AggregateFn<P, T>>,
) where
    P: Send + 'static,
    T: Send + 'static,
{
    let mut segmenter = Segmenter::new();
    let submit = |segment: Segment<P>| {
        debug!(
            "Closed segment '{}' with {} records starting at line {}",
            segment.group_key(),
            segment.len(),
            segment.first_line()
        );
        let records = segment.len() as u64;
        let ok =
            dispatch.submit(segment.ordinal(), segment.group_key().to_string(), segment, aggregate);
        dispatch.progress.log_if_needed(records);
        ok
    };

    loop {
        match ingest.pop() {
            Popped::Item(record) => {
                if let Some(segment) = segmenter.accept(record) {
                    if !submit(segment) {
                        return;
                    }
                }
            }
            Popped::Failed(e) => {
                if let Some(partial) = segmenter.finish() {
                    warn!(
                        "Discarding incomplete segment '{}' ({} records) after input error",
                        partial.group_key(),
                        partial.len()
                    );
                }
                dispatch.results.fail(e);
                return;
            }
            Popped::Exhausted => {
                if dispatch.shared.is_cancelled() {
                    return;
                }
                if let Some(last) = segmenter.finish() {
                    if !submit(last) {
                        return;
                    }
                }
                dispatch.finish();
                return;
            }
        }
    }
}
