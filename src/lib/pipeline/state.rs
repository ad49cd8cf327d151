//! Per-instance pipeline state shared by the lexer, dispatcher, tasks and consumer.

use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::config::ErrorPolicy;
use super::queue::QueueControl;
use crate::errors::SeqflowError;

/// Lifecycle of a pipeline instance.
///
/// `Open → Draining → Closed` on a clean run; `Failed` is terminal and can be
/// entered from `Open` or `Draining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// The lexer is still reading.
    Open,
    /// The lexer reached end of input; queued work is draining.
    Draining,
    /// Every result has been consumed.
    Closed,
    /// An unrecoverable error occurred.
    Failed,
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Open => write!(f, "open"),
            PipelineState::Draining => write!(f, "draining"),
            PipelineState::Closed => write!(f, "closed"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

/// State shared across one pipeline instance's stages.
pub(crate) struct PipelineShared {
    state: Mutex<PipelineState>,
    policy: ErrorPolicy,
    cancelled: AtomicBool,
    failure: Mutex<Option<SeqflowError>>,
    queues: Mutex<Vec<Arc<dyn QueueControl>>>,
}

impl PipelineShared {
    pub(crate) fn new(policy: ErrorPolicy) -> Self {
        Self {
            state: Mutex::new(PipelineState::Open),
            policy,
            cancelled: AtomicBool::new(false),
            failure: Mutex::new(None),
            queues: Mutex::new(Vec::new()),
        }
    }

    /// Registers a queue to be aborted on cancellation.
    pub(crate) fn register_queue(&self, queue: Arc<dyn QueueControl>) {
        self.queues.lock().push(queue);
    }

    pub(crate) fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    pub(crate) fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub(crate) fn begin_draining(&self) {
        let mut state = self.state.lock();
        if *state == PipelineState::Open {
            *state = PipelineState::Draining;
        }
    }

    pub(crate) fn mark_closed(&self) {
        let mut state = self.state.lock();
        if *state != PipelineState::Failed {
            *state = PipelineState::Closed;
        }
    }

    pub(crate) fn mark_failed(&self) {
        *self.state.lock() = PipelineState::Failed;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Stops all further work and wakes every suspended stage.
    pub(crate) fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let queues = self.queues.lock().clone();
        for queue in queues {
            queue.abort();
        }
    }

    /// Fails the pipeline with `error` and cancels it. Only the first error is kept.
    pub(crate) fn abort_with(&self, error: SeqflowError) {
        self.mark_failed();
        {
            let mut failure = self.failure.lock();
            if failure.is_none() && !self.is_cancelled() {
                *failure = Some(error);
            }
        }
        self.cancel();
    }

    /// Routes a transform failure according to the error policy.
    ///
    /// Under [`ErrorPolicy::FailFast`] the error becomes the pipeline failure and the
    /// task resolves as cancelled; otherwise the task keeps its own error.
    pub(crate) fn on_transform_error(&self, error: SeqflowError) -> SeqflowError {
        match self.policy {
            ErrorPolicy::Isolate => error,
            ErrorPolicy::FailFast => {
                self.abort_with(error);
                SeqflowError::Cancelled
            }
        }
    }

    pub(crate) fn take_failure(&self) -> Option<SeqflowError> {
        self.failure.lock().take()
    }
}
