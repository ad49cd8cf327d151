//! Input generators and small pipeline fixtures.

use std::io::{BufRead, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use seqflow_lib::errors::Result;
use seqflow_lib::pipeline::{RawRecord, RecordLexer};

/// The three-read FASTQ used throughout the end-to-end tests.
pub const THREE_READS: &str = "@r1\nACGT\n+\nFFFF\n@r2\nGG\n+\nFF\n@r3\nA\n+\nF\n";

/// Column header line of a single-sample GVCF.
pub const GVCF_HEADER: &str =
    "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\n";

/// Boxes an in-memory string as a line reader.
pub fn reader(text: &str) -> Box<dyn BufRead + Send> {
    Box::new(Cursor::new(text.as_bytes().to_vec()))
}

/// Deterministic sequence of `len` bases.
pub fn bases(seed: usize, len: usize) -> String {
    const ALPHABET: &[u8] = b"ACGTN";
    (0..len).map(|i| char::from(ALPHABET[(seed * 7 + i * 3) % ALPHABET.len()])).collect()
}

/// A FASTQ with `count` reads named `read0..`, lengths varying between 1 and 150.
pub fn fastq_text(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        let len = 1 + (i * 37) % 150;
        let quality: String = (0..len).map(|j| char::from(b'!' + ((i + j) % 40) as u8)).collect();
        text.push_str(&format!("@read{i} sample=1\n{}\n+\n{quality}\n", bases(i, len)));
    }
    text
}

/// One GVCF data line with a `GT:DP` sample column.
pub fn gvcf_line(chrom: &str, pos: u64, ref_allele: &str, alt: &str, info: &str, gt: &str) -> String {
    format!("{chrom}\t{pos}\t.\t{ref_allele}\t{alt}\t.\t.\t{info}\tGT:DP\t{gt}:12\n")
}

/// Writes `content` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test input");
    path
}

/// A lexer that yields `total` one-line records and counts how many it produced.
///
/// Record `i` has key `k{i}` and payload `i`.
pub struct CountingLexer {
    next: u64,
    total: u64,
    produced: Arc<AtomicU64>,
}

impl CountingLexer {
    /// Creates the lexer and returns the shared production counter.
    pub fn new(total: u64) -> (Self, Arc<AtomicU64>) {
        let produced = Arc::new(AtomicU64::new(0));
        (Self { next: 0, total, produced: Arc::clone(&produced) }, produced)
    }
}

impl RecordLexer for CountingLexer {
    type Payload = u64;

    fn source_name(&self) -> &str {
        "counting"
    }

    fn next_record(&mut self) -> Result<Option<RawRecord<u64>>> {
        if self.next == self.total {
            return Ok(None);
        }
        let i = self.next;
        self.next += 1;
        self.produced.fetch_add(1, Ordering::SeqCst);
        Ok(Some(RawRecord::new(i + 1, format!("k{i}"), i)))
    }
}
