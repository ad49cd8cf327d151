//! Integration tests for the seqflow library and CLI.
//!
//! These tests drive whole pipelines (lexer thread, dispatcher, worker pool and
//! consumer) over in-memory and on-disk inputs.

mod helpers;
mod test_commands;
mod test_error_paths;
mod test_fastq_pipeline;
mod test_pipeline_concurrency;
