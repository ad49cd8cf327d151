//! Count-bounded blocking queue used for both pipeline hand-offs.
//!
//! The same type backs the Ingestion Queue (lexer → dispatcher) and the Result
//! Queue (dispatcher → consumer). It is the only backpressure mechanism in the
//! pipeline: once `capacity` items are queued, `push` suspends the writer until
//! a reader frees a slot.
//!
//! # Termination
//!
//! A queue ends in one of three ways:
//!
//! - [`BoundedQueue::close`]: queued items drain, then readers see [`Popped::Exhausted`].
//! - [`BoundedQueue::fail`]: queued items drain, then exactly one reader sees
//!   [`Popped::Failed`], then [`Popped::Exhausted`]. A reader that is suspended on an
//!   empty queue is woken immediately.
//! - [`BoundedQueue::abort`]: queued items are dropped and every suspended reader or
//!   writer wakes up. Writers get [`SeqflowError::Cancelled`].
//!
//! # Example
//!
//! ```
//! use seqflow_lib::pipeline::queue::{BoundedQueue, Popped};
//!
//! let queue = BoundedQueue::new("ingest", 2);
//! queue.push(1).unwrap();
//! queue.push(2).unwrap();
//! queue.close();
//!
//! assert!(matches!(queue.pop(), Popped::Item(1)));
//! assert!(matches!(queue.pop(), Popped::Item(2)));
//! assert!(matches!(queue.pop(), Popped::Exhausted));
//! ```

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::errors::{Result, SeqflowError};

/// Statistics collected per queue, reported in the end-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Queue name.
    pub name: String,
    /// Fixed capacity.
    pub capacity: usize,
    /// Largest number of items held at once.
    pub peak_len: usize,
    /// Total items accepted.
    pub pushed: u64,
    /// Total time writers spent suspended on a full queue (milliseconds).
    pub time_blocked_ms: u64,
}

/// Result of a [`BoundedQueue::pop`].
#[derive(Debug)]
pub enum Popped<T> {
    /// The next item in FIFO order.
    Item(T),
    /// The queue is closed (or aborted) and empty.
    Exhausted,
    /// The writer injected a terminal error after its last item.
    Failed(SeqflowError),
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    aborted: bool,
    failure: Option<SeqflowError>,
}

/// A FIFO queue with a fixed item capacity and blocking push/pop.
pub struct BoundedQueue<T> {
    name: String,
    capacity: usize,
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,

    // Stats
    peak_len: AtomicUsize,
    pushed: AtomicU64,
    blocked_ns: AtomicU64,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items (at least 1).
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.max(1)),
                closed: false,
                aborted: false,
                failure: None,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            peak_len: AtomicUsize::new(0),
            pushed: AtomicU64::new(0),
            blocked_ns: AtomicU64::new(0),
        }
    }

    /// Appends an item, suspending while the queue is full.
    ///
    /// # Errors
    ///
    /// - [`SeqflowError::CapacityMisuse`] if the queue was closed or failed.
    /// - [`SeqflowError::Cancelled`] if the queue was aborted, including while suspended.
    pub fn push(&self, item: T) -> Result<()> {
        let mut state = self.state.lock();
        if Self::is_full(&state, self.capacity) {
            let start = Instant::now();
            while Self::is_full(&state, self.capacity) {
                self.not_full.wait(&mut state);
            }
            self.record_blocked(start);
        }
        self.enqueue(&mut state, item)
    }

    /// Appends an item, suspending at most `timeout` while the queue is full.
    ///
    /// Returns `Ok(Some(item))` when the queue stayed full for the whole timeout,
    /// handing the item back to the caller.
    ///
    /// # Errors
    ///
    /// Same as [`BoundedQueue::push`].
    pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<Option<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        let start = Instant::now();
        while Self::is_full(&state, self.capacity) {
            if self.not_full.wait_until(&mut state, deadline).timed_out()
                && Self::is_full(&state, self.capacity)
            {
                self.record_blocked(start);
                return Ok(Some(item));
            }
        }
        self.enqueue(&mut state, item)?;
        Ok(None)
    }

    /// Removes the next item, suspending while the queue is empty and still open.
    pub fn pop(&self) -> Popped<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(popped) = self.try_take(&mut state) {
                return popped;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Like [`BoundedQueue::pop`] but gives up after `timeout`, returning `None`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Popped<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(popped) = self.try_take(&mut state) {
                return Some(popped);
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                return self.try_take(&mut state);
            }
        }
    }

    /// Marks the end of input. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Closes the queue with a terminal error delivered after the queued items.
    ///
    /// Returns `false` (and drops `error`) if the queue was already closed.
    pub fn fail(&self, error: SeqflowError) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        state.failure = Some(error);
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    /// Drops everything queued and wakes every suspended reader and writer.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        state.closed = true;
        let dropped = std::mem::take(&mut state.items);
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
        drop(dropped);
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// True once `close`, `fail`, or `abort` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue name used in errors and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the queue's statistics.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            name: self.name.clone(),
            capacity: self.capacity,
            peak_len: self.peak_len.load(Ordering::Relaxed),
            pushed: self.pushed.load(Ordering::Relaxed),
            time_blocked_ms: self.blocked_ns.load(Ordering::Relaxed) / 1_000_000,
        }
    }

    fn is_full(state: &QueueState<T>, capacity: usize) -> bool {
        state.items.len() >= capacity && !state.closed
    }

    fn enqueue(&self, state: &mut MutexGuard<'_, QueueState<T>>, item: T) -> Result<()> {
        if state.aborted {
            return Err(SeqflowError::Cancelled);
        }
        if state.closed {
            return Err(SeqflowError::CapacityMisuse { queue: self.name.clone() });
        }
        state.items.push_back(item);
        self.pushed.fetch_add(1, Ordering::Relaxed);
        self.peak_len.fetch_max(state.items.len(), Ordering::Relaxed);
        self.not_empty.notify_one();
        Ok(())
    }

    fn try_take(&self, state: &mut MutexGuard<'_, QueueState<T>>) -> Option<Popped<T>> {
        if state.aborted {
            return Some(Popped::Exhausted);
        }
        if let Some(item) = state.items.pop_front() {
            self.not_full.notify_one();
            return Some(Popped::Item(item));
        }
        if let Some(error) = state.failure.take() {
            return Some(Popped::Failed(error));
        }
        if state.closed {
            return Some(Popped::Exhausted);
        }
        None
    }

    #[allow(clippy::cast_possible_truncation)]
    fn record_blocked(&self, start: Instant) {
        self.blocked_ns.fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
    }
}

/// Type-erased handle used to cancel and inspect queues of differing item types.
pub trait QueueControl: Send + Sync {
    /// See [`BoundedQueue::abort`].
    fn abort(&self);
    /// See [`BoundedQueue::stats`].
    fn stats(&self) -> QueueStats;
}

impl<T: Send> QueueControl for BoundedQueue<T> {
    fn abort(&self) {
        BoundedQueue::abort(self);
    }

    fn stats(&self) -> QueueStats {
        BoundedQueue::stats(self)
    }
}
