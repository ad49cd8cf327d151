//! Progress logging for long-running pipelines.
//!
//! A [`ProgressTracker`] is shared between the dispatcher (which counts units as it
//! submits them) and the consumer (which logs the final count). Lines are logged at
//! `info` level each time the running count crosses a multiple of the interval.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe counter that logs at regular intervals.
///
/// # Example
/// ```
/// use seqflow_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Dispatched", "records").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Dispatched 250 records (complete) ..."
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    unit: String,
    count: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Creates a tracker with a default interval of 100,000.
    ///
    /// # Arguments
    /// * `message` - Log line prefix (e.g., "Dispatched")
    /// * `unit` - What is being counted (e.g., "records", "segments")
    #[must_use]
    pub fn new(message: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            interval: 100_000,
            message: message.into(),
            unit: unit.into(),
            count: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Sets the logging interval. Zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds `additional` to the count, logging once per interval boundary crossed.
    ///
    /// Returns `true` if the count now sits exactly on an interval boundary, so
    /// [`ProgressTracker::log_final`] knows the last milestone was already logged.
    ///
    /// # Example
    /// ```
    /// use seqflow_lib::progress::ProgressTracker;
    ///
    /// let tracker = ProgressTracker::new("Items", "items").with_interval(100);
    /// assert!(!tracker.log_if_needed(50));
    /// assert!(!tracker.log_if_needed(60)); // logs "Items 100 items"
    /// assert!(tracker.log_if_needed(90)); // logs "Items 200 items"
    /// ```
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count.is_multiple_of(self.interval);
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let new_count = prev + additional;

        for milestone in (prev / self.interval + 1)..=(new_count / self.interval) {
            info!("{} {} {}", self.message, milestone * self.interval, self.unit);
        }

        new_count.is_multiple_of(self.interval)
    }

    /// Logs the final count with elapsed time and throughput.
    ///
    /// Nothing is logged when nothing was counted.
    pub fn log_final(&self) {
        let count = self.count();
        if count == 0 {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let rate = if elapsed > 0.0 { count as f64 / elapsed } else { 0.0 };
        info!(
            "{} {} {} (complete) in {:.1}s, {:.0} {}/s",
            self.message, count, self.unit, elapsed, rate, self.unit
        );
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
