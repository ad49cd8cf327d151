//! Input validation utilities
//!
//! Common validation functions for command-line parameters and file paths with
//! consistent error messages. All functions return structured errors from
//! [`crate::errors`].

use crate::errors::{Result, SeqflowError};
use std::fmt::Display;
use std::path::Path;

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";

/// True if `path` names standard input.
///
/// # Example
/// ```
/// use seqflow_lib::validation::is_stdin_path;
///
/// assert!(is_stdin_path("-"));
/// assert!(!is_stdin_path("reads.fq"));
/// ```
pub fn is_stdin_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().as_os_str() == STDIN_PATH
}

/// Validate that a file exists
///
/// Standard input (`-`) always passes.
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input FASTQ", "Reference")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use seqflow_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/reads.fq", "Input FASTQ");
/// assert!(result.is_err());
/// assert!(validate_file_exists("-", "Input FASTQ").is_ok());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if is_stdin_path(path_ref) {
        return Ok(());
    }
    if !path_ref.exists() {
        return Err(SeqflowError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate every `(path, description)` pair of a command's inputs.
///
/// `-` entries pass; pair this with [`validate_single_stdin`] so that at most one
/// input reads standard input.
///
/// # Errors
/// Returns the error for the first input that does not exist.
///
/// # Example
/// ```
/// use seqflow_lib::validation::validate_files_exist;
///
/// assert!(validate_files_exist(&[("-", "Input GVCF")]).is_ok());
/// let err = validate_files_exist(&[("-", "Input GVCF"), ("/nonexistent/ref.fa", "Reference FASTA")])
///     .unwrap_err();
/// assert!(err.to_string().contains("Reference FASTA"));
/// ```
pub fn validate_files_exist<P: AsRef<Path>>(inputs: &[(P, &str)]) -> Result<()> {
    inputs.iter().try_for_each(|(path, description)| validate_file_exists(path, description))
}

/// Validate that at most one of the given paths is standard input.
///
/// Two stages cannot both consume the one stdin stream.
///
/// # Errors
/// Returns an error naming the second parameter that reads from `-`.
pub fn validate_single_stdin<P: AsRef<Path>>(paths: &[(P, &str)]) -> Result<()> {
    let mut first: Option<&str> = None;
    for (path, name) in paths {
        if !is_stdin_path(path) {
            continue;
        }
        if let Some(previous) = first {
            return Err(SeqflowError::InvalidParameter {
                parameter: (*name).to_string(),
                reason: format!("standard input is already used by {previous}"),
            });
        }
        first = Some(name);
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Arguments
/// * `value` - Value to validate
/// * `name` - Name of the parameter for error messages
///
/// # Errors
/// Returns an error if the value is not positive
///
/// # Example
/// ```
/// use seqflow_lib::validation::validate_positive;
///
/// validate_positive(4, "threads").unwrap();
///
/// let result = validate_positive(0, "ingest-capacity");
/// assert!(result.is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(SeqflowError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}
