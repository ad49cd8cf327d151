//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use seqflow_lib::errors::SeqflowError;
use seqflow_lib::pipeline::config::{DEFAULT_INGEST_CAPACITY, DEFAULT_RESULT_CAPACITY};
use seqflow_lib::pipeline::{ErrorPolicy, PipelineConfig, WorkerPool};
use seqflow_lib::validation::validate_file_exists;

/// Input/output options for commands that read one file and write one file.
#[derive(Debug, Clone, Args)]
pub struct IoOptions {
    /// Input file, plain or gzip (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file; a `.gz` suffix compresses it (`-` for stdout)
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

impl IoOptions {
    /// Validates that the input file exists (skipped for stdin paths).
    ///
    /// # Errors
    ///
    /// Returns an error if the input file does not exist.
    pub fn validate(&self, description: &str) -> Result<()> {
        validate_file_exists(&self.input, description)?;
        Ok(())
    }

    /// Name used for the input in log lines and error messages.
    #[must_use]
    pub fn input_name(&self) -> String {
        self.input.display().to_string()
    }
}

/// Worker pool, queue capacities and error policy.
#[derive(Debug, Clone, Args)]
pub struct PipelineOptions {
    /// Number of worker threads for record transformation.
    #[arg(short = 't', long = "threads", default_value_t = 4)]
    pub threads: usize,

    /// Records the lexer may run ahead of the dispatcher.
    #[arg(long = "ingest-capacity", default_value_t = DEFAULT_INGEST_CAPACITY)]
    pub ingest_capacity: usize,

    /// Submitted results the dispatcher may run ahead of the writer.
    #[arg(long = "result-capacity", default_value_t = DEFAULT_RESULT_CAPACITY)]
    pub result_capacity: usize,

    /// Stop at the first error of any kind instead of skipping records that fail to transform.
    #[arg(long = "fail-fast", default_value = "false")]
    pub fail_fast: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            threads: 4,
            ingest_capacity: DEFAULT_INGEST_CAPACITY,
            result_capacity: DEFAULT_RESULT_CAPACITY,
            fail_fast: false,
        }
    }
}

impl PipelineOptions {
    /// The selected error policy.
    #[must_use]
    pub fn error_policy(&self) -> ErrorPolicy {
        if self.fail_fast { ErrorPolicy::FailFast } else { ErrorPolicy::Isolate }
    }

    /// Builds a validated pipeline configuration named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if a capacity is zero.
    pub fn pipeline_config(&self, name: &str) -> Result<PipelineConfig> {
        let config = PipelineConfig::new(name)
            .with_ingest_capacity(self.ingest_capacity)
            .with_result_capacity(self.result_capacity)
            .with_error_policy(self.error_policy());
        config.validate()?;
        Ok(config)
    }

    /// Builds the worker pool.
    ///
    /// # Errors
    ///
    /// Returns an error if `--threads` is zero or the pool cannot start.
    pub fn worker_pool(&self) -> Result<WorkerPool> {
        Ok(WorkerPool::new(self.threads)?)
    }

    /// Decides whether a result error ends the command.
    ///
    /// Under fail-fast every error does; otherwise only errors that stop the lexer.
    #[must_use]
    pub fn is_terminal(&self, error: &SeqflowError) -> bool {
        self.fail_fast || error.is_fatal()
    }
}
