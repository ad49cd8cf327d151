//! FASTA lexing and sequence construction.
//!
//! Records start at a `>` header and run until the next header, a `;` comment
//! line, or end of input. Sequence lines are joined after trimming. Comment lines
//! and blank lines between records are skipped; any other line where a header is
//! expected is malformed.
//!
//! Both `>id desc` and `> id desc` are accepted.

use anyhow::{Result as AnyResult, bail};
use std::io::BufRead;

use crate::dna::SeqType;
use crate::errors::Result;
use crate::pipeline::{LineSource, RawRecord, RecordLexer};
use crate::record::SeqRecord;

/// The lines of one FASTA record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaLines {
    /// Record id.
    pub id: String,
    /// Header text after the id, if any.
    pub description: Option<String>,
    /// Sequence lines, untrimmed, in file order.
    pub lines: Vec<Vec<u8>>,
}

/// Sequential FASTA record lexer.
pub struct FastaLexer {
    lines: LineSource,
}

impl FastaLexer {
    /// Creates a lexer over `reader`; `name` is used in error messages.
    pub fn new(reader: Box<dyn BufRead + Send>, name: impl Into<String>) -> Self {
        Self { lines: LineSource::new(reader, name) }
    }
}

/// Splits a `>` header into id and description.
fn parse_header(header: &str) -> (Option<String>, Option<String>) {
    let body = header.strip_prefix('>').unwrap_or(header).trim_start();
    let mut parts = body.splitn(2, char::is_whitespace);
    let id = parts.next().filter(|id| !id.is_empty()).map(str::to_string);
    let description = parts.next().map(str::trim).filter(|d| !d.is_empty()).map(str::to_string);
    (id, description)
}

impl RecordLexer for FastaLexer {
    type Payload = FastaLines;

    fn source_name(&self) -> &str {
        self.lines.name()
    }

    fn next_record(&mut self) -> Result<Option<RawRecord<FastaLines>>> {
        let header = loop {
            let Some(line) = self.lines.next_line()? else {
                return Ok(None);
            };
            let text = String::from_utf8_lossy(line);
            let text = text.trim();
            if text.is_empty() || text.starts_with(';') {
                continue;
            }
            if !text.starts_with('>') {
                let at = self.lines.line_number();
                return Err(self.lines.malformed(at, "expected a '>' header line"));
            }
            break text.to_string();
        };
        let start = self.lines.line_number();

        let (Some(id), description) = parse_header(&header) else {
            return Err(self.lines.malformed(start, "empty sequence name"));
        };

        let mut lines = Vec::new();
        while let Some(line) = self.lines.next_line()? {
            if line.starts_with(b">") || line.starts_with(b";") {
                self.lines.unread();
                break;
            }
            lines.push(line.to_vec());
        }

        Ok(Some(RawRecord::new(start, id.clone(), FastaLines { id, description, lines })))
    }
}

/// Returns a transform that joins sequence lines and validates them against `seq_type`.
///
/// # Examples
///
/// ```
/// use seqflow_lib::dna::SeqType;
/// use seqflow_lib::fasta::{FastaLines, fasta_transform};
/// use seqflow_lib::pipeline::RawRecord;
///
/// let transform = fasta_transform(SeqType::Protein);
/// let lines = FastaLines { id: "p1".into(), description: None, lines: vec![b"MKV".to_vec(), b"LA*".to_vec()] };
/// let record = transform(RawRecord::new(1, "p1", lines)).unwrap();
/// assert_eq!(record.sequence, b"MKVLA*");
/// ```
pub fn fasta_transform(seq_type: SeqType) -> impl Fn(RawRecord<FastaLines>) -> AnyResult<SeqRecord> + Send + Sync + 'static {
    move |record| {
        let FastaLines { id, description, lines } = record.payload;
        let mut sequence = Vec::with_capacity(lines.iter().map(Vec::len).sum());
        for line in &lines {
            sequence.extend_from_slice(line.trim_ascii());
        }
        if let Some(pos) = seq_type.first_invalid(&sequence) {
            bail!(
                "invalid {} symbol '{}' at position {} (record at line {})",
                seq_type.name(),
                char::from(sequence[pos]),
                pos + 1,
                record.line_number
            );
        }
        sequence.make_ascii_uppercase();
        Ok(SeqRecord::new(id, sequence).with_description(description).with_seq_type(seq_type))
    }
}
