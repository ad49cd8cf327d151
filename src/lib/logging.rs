//! Formatting helpers and end-of-run summaries for log output.

use std::time::{Duration, Instant};

use crate::pipeline::queue::QueueStats;

/// Formats an integer with thousands separators.
///
/// # Examples
///
/// ```
/// use seqflow_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage.
///
/// # Examples
///
/// ```
/// use seqflow_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration as e.g. "45s", "2m 15s" or "1h 30m".
///
/// # Examples
///
/// ```
/// use seqflow_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput, e.g. "1,000 records/s".
///
/// Rates below one per second are reported per minute.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration, unit: &str) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} {unit}/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} {unit}/s", format_count(rate as u64))
    } else {
        format!("{:.1} {unit}/min", count as f64 / (secs / 60.0))
    }
}

/// Logs the end-of-run summary of one pipeline instance.
///
/// # Examples
///
/// ```no_run
/// use seqflow_lib::logging::log_pipeline_summary;
/// use seqflow_lib::pipeline::queue::QueueStats;
/// use std::time::Duration;
///
/// let stats = vec![QueueStats { name: "ingest".into(), capacity: 5, ..Default::default() }];
/// log_pipeline_summary("fastq", 1_000, 2, &stats, Duration::from_secs(3));
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn log_pipeline_summary(
    name: &str,
    delivered: u64,
    failed: u64,
    queues: &[QueueStats],
    elapsed: Duration,
) {
    log::info!("Pipeline '{name}' summary:");
    log::info!("  Results delivered: {}", format_count(delivered));
    if failed > 0 {
        let total = delivered + failed;
        log::info!(
            "  Results failed: {} ({})",
            format_count(failed),
            format_percent(failed as f64 / total as f64, 2)
        );
    }
    log::info!(
        "  Elapsed: {} ({})",
        format_duration(elapsed),
        format_rate(delivered, elapsed, "results")
    );
    for queue in queues {
        log::debug!(
            "  Queue '{}': capacity {}, peak {}, pushed {}, writers blocked {}ms",
            queue.name,
            queue.capacity,
            queue.peak_len,
            format_count(queue.pushed),
            queue.time_blocked_ms
        );
    }
}

/// Logs the start of an operation and, later, its completion with timing.
///
/// # Examples
///
/// ```no_run
/// use seqflow_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Loading reference");
/// // ... do work ...
/// timer.log_completion(25, "contigs");
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Starts the timer and logs "`operation` ...".
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs completion with an item count and rate.
    pub fn log_completion(&self, count: u64, unit: &str) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} {unit} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration, unit)
        );
    }
}
