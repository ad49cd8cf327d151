//! Pipeline tuning parameters and error policy.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::anyhow;

use crate::errors::Result;
use crate::validation::validate_positive;

/// Default Ingestion Queue capacity.
pub const DEFAULT_INGEST_CAPACITY: usize = 5;

/// Default Result Queue capacity.
pub const DEFAULT_RESULT_CAPACITY: usize = 5;

/// Default number of dispatched records between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// What a pipeline does when a record or segment fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Transform errors fail only their own record; a malformed record stops the
    /// lexer but everything lexed before it is still delivered.
    #[default]
    Isolate,
    /// The first error of any kind cancels outstanding work and ends the stream.
    FailFast,
}

impl Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::Isolate => write!(f, "isolate"),
            ErrorPolicy::FailFast => write!(f, "fail-fast"),
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = anyhow::Error;
    fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
        match string {
            "isolate" => Ok(ErrorPolicy::Isolate),
            "fail-fast" | "failfast" => Ok(ErrorPolicy::FailFast),
            _ => Err(anyhow!("Invalid error policy: '{string}' (valid values: 'isolate', 'fail-fast')")),
        }
    }
}

/// Tuning parameters for one pipeline instance.
///
/// Capacities bound how far the lexer and dispatcher may run ahead of the
/// consumer; they do not bound transform parallelism, which is set by the
/// [`WorkerPool`](super::pool::WorkerPool) size.
///
/// # Example
/// ```
/// use seqflow_lib::pipeline::{ErrorPolicy, PipelineConfig};
///
/// let config = PipelineConfig::new("reads")
///     .with_ingest_capacity(16)
///     .with_result_capacity(32)
///     .with_error_policy(ErrorPolicy::FailFast);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name used in log lines and thread names.
    pub name: String,
    /// Ingestion Queue capacity.
    pub ingest_capacity: usize,
    /// Result Queue capacity.
    pub result_capacity: usize,
    /// Error policy.
    pub error_policy: ErrorPolicy,
    /// Records between progress log lines.
    pub progress_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new("pipeline")
    }
}

impl PipelineConfig {
    /// Creates a config with default capacities.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingest_capacity: DEFAULT_INGEST_CAPACITY,
            result_capacity: DEFAULT_RESULT_CAPACITY,
            error_policy: ErrorPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Sets the Ingestion Queue capacity.
    #[must_use]
    pub fn with_ingest_capacity(mut self, capacity: usize) -> Self {
        self.ingest_capacity = capacity;
        self
    }

    /// Sets the Result Queue capacity.
    #[must_use]
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    /// Sets the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Sets the progress logging interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Checks that every capacity and interval is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`SeqflowError::InvalidParameter`](crate::errors::SeqflowError::InvalidParameter)
    /// naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.ingest_capacity, "ingest-capacity")?;
        validate_positive(self.result_capacity, "result-capacity")?;
        validate_positive(self.progress_interval, "progress-interval")?;
        Ok(())
    }
}
