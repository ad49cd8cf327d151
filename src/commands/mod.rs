//! CLI command implementations for seqflow.
//!
//! # Command Categories
//!
//! ## Conversion
//! - [`fastq_to_fasta`] - Convert FASTQ reads to FASTA in input order
//!
//! ## Consensus
//! - [`consensus`] - Build per-contig consensus sequences from a GVCF

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod consensus;
pub mod fastq_to_fasta;
