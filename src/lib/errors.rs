//! Custom error types for seqflow operations.

use thiserror::Error;

/// Result type alias for seqflow operations
pub type Result<T> = std::result::Result<T, SeqflowError>;

/// Error type for seqflow operations
#[derive(Error, Debug)]
pub enum SeqflowError {
    /// A record boundary or line violated the input grammar.
    ///
    /// This is the only fatal parse error: the lexer stops at the first one.
    #[error("Malformed record in '{path}' at line {line}: {reason}")]
    MalformedInput {
        /// Name of the input (file path or `-` for stdin)
        path: String,
        /// 1-based line number where the violation was detected
        line: u64,
        /// Explanation of the problem
        reason: String,
    },

    /// The per-record or per-segment transform failed.
    #[error("Failed to transform '{key}' (ordinal {ordinal}): {source}")]
    Transform {
        /// Record id or group key of the failing unit
        key: String,
        /// Submission-order index of the failing unit
        ordinal: u64,
        /// The underlying failure
        #[source]
        source: anyhow::Error,
    },

    /// Push to a queue that was already closed; a pipeline construction bug.
    #[error("Push to closed queue '{queue}'")]
    CapacityMisuse {
        /// Name of the queue
        queue: String,
    },

    /// The pipeline was cancelled before this unit of work completed.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Two results carried the same key while collecting into a map.
    #[error("Duplicate key '{key}' while collecting results")]
    DuplicateKey {
        /// The repeated key
        key: String,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error that is not tied to a single line
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "GVCF", "FASTQ")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// The input could not be read.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        /// Name of the input
        path: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A pipeline thread or transform task panicked.
    #[error("Pipeline {stage} panicked")]
    WorkerPanicked {
        /// Which stage panicked (lexer, dispatcher, transform)
        stage: String,
    },
}

impl SeqflowError {
    /// Creates a [`SeqflowError::MalformedInput`].
    pub fn malformed(path: &str, line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedInput { path: path.to_string(), line, reason: reason.into() }
    }

    /// Returns the line number for malformed-input errors.
    #[must_use]
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::MalformedInput { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// True if this error stops the lexer (as opposed to failing a single record).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transform { .. } | Self::DuplicateKey { .. })
    }
}
