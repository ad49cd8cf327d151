//! Integration tests for the CLI commands.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use crate::helpers::{GVCF_HEADER, THREE_READS, fastq_text, gvcf_line, write_file};

fn seqflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seqflow")).args(args).output().expect("Failed to run seqflow")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn test_fastq_to_fasta() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "reads.fq", THREE_READS);
    let output = dir.path().join("reads.fa");

    let result = seqflow(&["fastq-to-fasta", "-i", path_str(&input), "-o", path_str(&output), "-t", "4"]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(fs::read_to_string(&output).unwrap(), ">r1\nACGT\n>r2\nGG\n>r3\nA\n");
}

#[test]
fn test_fastq_to_fasta_preserves_order_and_wraps() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "reads.fq", &fastq_text(400));
    let output = dir.path().join("reads.fa");

    let result = seqflow(&[
        "fastq-to-fasta",
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "--line-width",
        "50",
        "--ingest-capacity",
        "2",
        "--result-capacity",
        "3",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let text = fs::read_to_string(&output).unwrap();
    let headers: Vec<&str> = text.lines().filter(|line| line.starts_with('>')).collect();
    assert_eq!(headers.len(), 400);
    for (i, header) in headers.iter().enumerate() {
        assert_eq!(*header, format!(">read{i} sample=1"));
    }
    assert!(text.lines().all(|line| line.len() <= 50 || line.starts_with('>')));
}

#[test]
fn test_fastq_to_fasta_malformed_input_fails_after_writing_prefix() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "reads.fq", &THREE_READS.replacen("GG\n+\n", "GG\nx\n", 1));
    let output = dir.path().join("reads.fa");

    let result = seqflow(&["fastq-to-fasta", "-i", path_str(&input), "-o", path_str(&output)]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("line 7"), "{stderr}");
    assert_eq!(fs::read_to_string(&output).unwrap(), ">r1\nACGT\n");
}

#[test]
fn test_fastq_to_fasta_skips_invalid_reads_unless_fail_fast() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "reads.fq", "@r1\nACGT\n+\nFFFF\n@r2\nGG\n+\nF\n@r3\nA\n+\nF\n");
    let output = dir.path().join("reads.fa");

    let result = seqflow(&["fastq-to-fasta", "-i", path_str(&input), "-o", path_str(&output)]);
    assert!(result.status.success());
    assert_eq!(fs::read_to_string(&output).unwrap(), ">r1\nACGT\n>r3\nA\n");

    let result = seqflow(&["fastq-to-fasta", "-i", path_str(&input), "-o", path_str(&output), "--fail-fast"]);
    assert!(!result.status.success());
}

#[test]
fn test_missing_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("reads.fa");
    let result = seqflow(&["fastq-to-fasta", "-i", "/nonexistent/reads.fq", "-o", path_str(&output)]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("File does not exist"));
}

#[test]
fn test_consensus() {
    let dir = TempDir::new().unwrap();
    let reference = write_file(dir.path(), "ref.fa", ">chr1\nACGTACGTAC\n>chr2\nGGGGCCCC\n");
    let gvcf = format!(
        "{GVCF_HEADER}{}{}{}{}",
        gvcf_line("chr1", 1, "A", "<NON_REF>", "END=4", "0/0"),
        gvcf_line("chr1", 5, "A", "T,<NON_REF>", ".", "1/1"),
        gvcf_line("chr1", 6, "C", "<NON_REF>", "END=10", "0/0"),
        gvcf_line("chr2", 1, "G", "<NON_REF>", "END=8", "0/0"),
    );
    let input = write_file(dir.path(), "sample.g.vcf", &gvcf);
    let output = dir.path().join("consensus.fa");

    let result = seqflow(&[
        "consensus",
        "-i",
        path_str(&input),
        "-r",
        path_str(&reference),
        "-o",
        path_str(&output),
        "--line-width",
        "6",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(fs::read_to_string(&output).unwrap(), ">chr1\nACGTTC\nGTAC\n>chr2\nGGGGCC\nCC\n");
}

#[test]
fn test_consensus_rejects_multi_sample_gvcf() {
    let dir = TempDir::new().unwrap();
    let reference = write_file(dir.path(), "ref.fa", ">chr1\nACGT\n");
    let input = write_file(
        dir.path(),
        "multi.g.vcf",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\n",
    );
    let output = dir.path().join("consensus.fa");

    let result = seqflow(&[
        "consensus",
        "-i",
        path_str(&input),
        "-r",
        path_str(&reference),
        "-o",
        path_str(&output),
    ]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("expected exactly 1 sample"));
}

#[test]
fn test_consensus_rejects_stdin_for_both_inputs() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("consensus.fa");

    let result = seqflow(&["consensus", "-i", "-", "-r", "-", "-o", path_str(&output)]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("standard input is already used by Input GVCF"), "{stderr}");
    assert!(!output.exists());
}

#[test]
fn test_consensus_reports_missing_reference() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "sample.g.vcf", GVCF_HEADER);
    let output = dir.path().join("consensus.fa");

    let result = seqflow(&["consensus", "-i", path_str(&input), "-r", "/nonexistent/ref.fa", "-o", path_str(&output)]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Reference FASTA") && stderr.contains("File does not exist"), "{stderr}");
}
