//! Single-sample GVCF lexing and per-contig consensus.
//!
//! Each data line is one record whose group key is its `CHROM`. Records for a
//! contig are expected to be contiguous; the segmented pipeline hands each run
//! to [`gvcf_consensus`], which walks the sample's genotype along the run and
//! emits one sequence per contig:
//!
//! - a reference call contributes the reference bases over `[POS, END]`,
//! - an alternate call contributes its allele bases,
//! - `*`, symbolic (`<NON_REF>`, `<DEL>`, ...) and no-call alleles contribute nothing.
//!
//! Only the first allele of the genotype is used, so a haploid consensus is
//! built even from diploid calls.

use anyhow::{Result as AnyResult, anyhow, bail};
use log::debug;
use std::io::BufRead;
use std::sync::Arc;

use crate::errors::{Result, SeqflowError};
use crate::pipeline::{LineSource, RawRecord, RecordLexer, Segment};
use crate::record::SeqRecord;
use crate::reference::ReferenceGenome;

const MIN_COLUMNS: usize = 10;
const SAMPLE_COLUMN: usize = 9;

/// The allele selected by the first entry of a sample's `GT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalledAllele {
    /// Allele index 0.
    Reference,
    /// An entry of `ALT`, upper-cased.
    Alternate(String),
    /// `.` or no `GT` field.
    NoCall,
}

/// One GVCF data line, reduced to what the consensus needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GvcfVariant {
    /// Contig name.
    pub chrom: String,
    /// 1-based start.
    pub pos: u64,
    /// 1-based inclusive end: `INFO/END` or the last base of `REF`.
    pub end: u64,
    /// Upper-cased reference allele.
    pub ref_allele: String,
    /// The sample's first called allele.
    pub allele: CalledAllele,
}

/// Sequential GVCF lexer.
///
/// The header is read when the lexer is created, so a file that is not
/// single-sample is rejected before any pipeline starts.
pub struct GvcfLexer {
    lines: LineSource,
    sample: String,
}

impl std::fmt::Debug for GvcfLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GvcfLexer").field("source", &self.lines.name()).field("sample", &self.sample).finish()
    }
}

impl GvcfLexer {
    /// Reads the header of `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`SeqflowError::InvalidFileFormat`] if the `#CHROM` line is missing
    /// or does not name exactly one sample.
    pub fn new(reader: Box<dyn BufRead + Send>, name: impl Into<String>) -> Result<Self> {
        let mut lines = LineSource::new(reader, name);
        let invalid = |lines: &LineSource, reason: String| SeqflowError::InvalidFileFormat {
            file_type: "GVCF".to_string(),
            path: lines.name().to_string(),
            reason,
        };

        let mut meta_lines = 0u64;
        let header = loop {
            let Some(line) = lines.next_line()? else {
                return Err(invalid(&lines, "missing #CHROM header line".to_string()));
            };
            if line.starts_with(b"##") {
                meta_lines += 1;
                continue;
            }
            if line.starts_with(b"#CHROM") {
                break String::from_utf8_lossy(line).into_owned();
            }
            return Err(invalid(&lines, format!("expected #CHROM header before line {}", lines.line_number())));
        };

        let columns: Vec<&str> = header.split('\t').collect();
        let samples = columns.len().saturating_sub(SAMPLE_COLUMN);
        if samples != 1 {
            return Err(invalid(&lines, format!("expected exactly 1 sample, found {samples}")));
        }
        let sample = columns[SAMPLE_COLUMN].to_string();
        debug!("GVCF '{}' has {meta_lines} meta lines and sample '{sample}'", lines.name());
        Ok(Self { lines, sample })
    }

    /// The single sample named in the header.
    #[must_use]
    pub fn sample(&self) -> &str {
        &self.sample
    }

    fn parse_line(&self, line: &str, at: u64) -> Result<GvcfVariant> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < MIN_COLUMNS {
            return Err(self.lines.malformed(
                at,
                format!("expected at least {MIN_COLUMNS} tab-separated columns, found {}", columns.len()),
            ));
        }

        let chrom = columns[0];
        if chrom.is_empty() {
            return Err(self.lines.malformed(at, "empty CHROM"));
        }
        let pos = match columns[1].parse::<u64>() {
            Ok(pos) if pos >= 1 => pos,
            _ => return Err(self.lines.malformed(at, format!("invalid POS '{}'", columns[1]))),
        };
        let ref_allele = columns[3].to_ascii_uppercase();
        if ref_allele.is_empty() || ref_allele == "." {
            return Err(self.lines.malformed(at, "missing REF allele"));
        }
        let alts: Vec<&str> =
            if columns[4] == "." { Vec::new() } else { columns[4].split(',').collect() };

        let end = match info_end(columns[7]) {
            Some(Ok(end)) if end >= pos => end,
            Some(_) => {
                return Err(self.lines.malformed(at, format!("invalid END in INFO '{}'", columns[7])));
            }
            None => match pos.checked_add(ref_allele.len() as u64 - 1) {
                Some(end) => end,
                None => return Err(self.lines.malformed(at, "POS + REF length overflows")),
            },
        };

        let allele = match genotype_index(columns[8], columns[SAMPLE_COLUMN]) {
            None => CalledAllele::NoCall,
            Some(Err(gt)) => {
                return Err(self.lines.malformed(at, format!("invalid GT '{gt}'")));
            }
            Some(Ok(0)) => CalledAllele::Reference,
            Some(Ok(index)) => match alts.get(index - 1) {
                Some(alt) => CalledAllele::Alternate(alt.to_ascii_uppercase()),
                None => {
                    return Err(self.lines.malformed(
                        at,
                        format!("GT allele {index} has no ALT allele ({} listed)", alts.len()),
                    ));
                }
            },
        };

        Ok(GvcfVariant { chrom: chrom.to_string(), pos, end, ref_allele, allele })
    }
}

/// `END` from an INFO column, if present.
fn info_end(info: &str) -> Option<std::result::Result<u64, std::num::ParseIntError>> {
    info.split(';').find_map(|field| field.strip_prefix("END=")).map(str::parse)
}

/// Index of the first allele of the sample's `GT`.
///
/// `None` for a no-call or a missing `GT`; `Some(Err(gt))` if it does not parse.
fn genotype_index<'a>(format: &str, sample: &'a str) -> Option<std::result::Result<usize, &'a str>> {
    let gt_index = format.split(':').position(|key| key == "GT")?;
    let gt = sample.split(':').nth(gt_index)?;
    let first = gt.split(['/', '|']).next().unwrap_or_default();
    if first == "." || first.is_empty() {
        return None;
    }
    Some(first.parse::<usize>().map_err(|_| gt))
}

impl RecordLexer for GvcfLexer {
    type Payload = GvcfVariant;

    fn source_name(&self) -> &str {
        self.lines.name()
    }

    fn next_record(&mut self) -> Result<Option<RawRecord<GvcfVariant>>> {
        loop {
            let Some(line) = self.lines.next_line()? else {
                return Ok(None);
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let text = String::from_utf8_lossy(line).into_owned();
            let at = self.lines.line_number();
            if text.starts_with('#') {
                return Err(self.lines.malformed(at, "header line after the first data line"));
            }
            let variant = self.parse_line(&text, at)?;
            return Ok(Some(RawRecord::new(at, variant.chrom.clone(), variant)));
        }
    }
}

/// Returns the aggregation that builds one contig's consensus from a segment.
///
/// # Errors
///
/// The returned closure fails if a reference call names a contig missing from
/// `reference`, extends past the contig end, or has a `REF` that disagrees with
/// the reference bases.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use std::sync::Arc;
/// use seqflow_lib::gvcf::{GvcfLexer, gvcf_consensus};
/// use seqflow_lib::pipeline::{PipelineConfig, RecordPipeline, WorkerPool};
/// use seqflow_lib::reference::ReferenceGenome;
///
/// let reference = Arc::new(ReferenceGenome::from_sequences([("chr1", b"ACGTACGT".to_vec())]));
/// let gvcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
///             chr1\t1\t.\tA\t<NON_REF>\t.\t.\tEND=4\tGT\t0\n\
///             chr1\t5\t.\tA\tG,<NON_REF>\t.\t.\t.\tGT\t1\n";
/// let lexer = GvcfLexer::new(Box::new(Cursor::new(gvcf.as_bytes().to_vec())), "s1.g.vcf").unwrap();
/// let pool = WorkerPool::new(2).unwrap();
/// let pipeline =
///     RecordPipeline::segmented(lexer, gvcf_consensus(reference), &pool, PipelineConfig::new("gvcf")).unwrap();
/// let consensus = pipeline.read_all().unwrap();
/// assert_eq!(consensus.get("chr1").unwrap().sequence, b"ACGTG");
/// ```
pub fn gvcf_consensus(
    reference: Arc<ReferenceGenome>,
) -> impl Fn(Segment<GvcfVariant>) -> AnyResult<SeqRecord> + Send + Sync + 'static {
    move |segment| {
        let contig = segment.group_key().to_string();
        let contig_sequence = reference.get(&contig);
        let mut sequence = Vec::new();

        for record in segment {
            let variant = record.payload;
            match variant.allele {
                CalledAllele::Reference => {
                    let bases = contig_sequence
                        .ok_or_else(|| anyhow!("contig '{contig}' does not exist in the reference"))?;
                    let start = usize::try_from(variant.pos - 1)?;
                    let end = usize::try_from(variant.end)?;
                    if end > bases.len() {
                        bail!(
                            "{contig}:{}-{} (line {}) extends past the end of the reference contig ({} bp)",
                            variant.pos,
                            variant.end,
                            record.line_number,
                            bases.len()
                        );
                    }
                    let slice = &bases[start..end];
                    if !slice.starts_with(variant.ref_allele.as_bytes()) {
                        bail!(
                            "REF '{}' at {contig}:{} (line {}) does not match the reference '{}'",
                            variant.ref_allele,
                            variant.pos,
                            record.line_number,
                            String::from_utf8_lossy(&slice[..variant.ref_allele.len().min(slice.len())])
                        );
                    }
                    sequence.extend_from_slice(slice);
                }
                CalledAllele::Alternate(alt) => {
                    if alt != "*" && !alt.starts_with('<') {
                        sequence.extend_from_slice(alt.as_bytes());
                    }
                }
                CalledAllele::NoCall => {}
            }
        }

        Ok(SeqRecord::new(contig, sequence))
    }
}
