//! FASTQ lexing and read construction.
//!
//! The lexer recognises four-line records:
//!
//! ```text
//! @<id> [description]
//! <sequence>
//! +[<id> [description]]
//! <quality>
//! ```
//!
//! It enforces only record structure: the header marker, the separator (empty or an
//! echo of the header), and that every line is present. Whether sequence and quality
//! agree in length, and whether the sequence uses a valid alphabet, is checked by
//! [`fastq_transform`] on the worker pool.
//!
//! Blank lines between records are skipped. A quality line that begins with `@` and
//! whose length differs from the sequence is taken to be the next record's header,
//! i.e. a missing quality line.

use anyhow::{Result as AnyResult, bail};
use std::io::BufRead;

use crate::dna::SeqType;
use crate::errors::Result;
use crate::pipeline::{LineSource, RawRecord, RecordLexer};
use crate::record::{SeqRecord, split_header};

/// The lines of one FASTQ record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqLines {
    /// Header text after `@`.
    pub header: String,
    /// Raw sequence line.
    pub sequence: Vec<u8>,
    /// Raw quality line.
    pub quality: Vec<u8>,
}

/// Sequential FASTQ record lexer.
pub struct FastqLexer {
    lines: LineSource,
}

impl FastqLexer {
    /// Creates a lexer over `reader`; `name` is used in error messages.
    pub fn new(reader: Box<dyn BufRead + Send>, name: impl Into<String>) -> Self {
        Self { lines: LineSource::new(reader, name) }
    }

    fn required_line(&mut self, what: &str) -> Result<Vec<u8>> {
        let expected_at = self.lines.line_number() + 1;
        match self.lines.next_line()? {
            Some(line) => Ok(line.to_vec()),
            None => Err(self.lines.malformed(expected_at, format!("truncated record: missing {what} line"))),
        }
    }
}

impl RecordLexer for FastqLexer {
    type Payload = FastqLines;

    fn source_name(&self) -> &str {
        self.lines.name()
    }

    fn next_record(&mut self) -> Result<Option<RawRecord<FastqLines>>> {
        let header_line = loop {
            match self.lines.next_line()? {
                None => return Ok(None),
                Some(line) if line.iter().all(u8::is_ascii_whitespace) => {}
                Some(line) => break line.to_vec(),
            }
        };
        let start = self.lines.line_number();

        if header_line.first() != Some(&b'@') {
            return Err(self.lines.malformed(start, "expected a header line starting with '@'"));
        }
        let header = String::from_utf8_lossy(&header_line[1..]).trim().to_string();
        let (id, _) = split_header(&header);
        if id.is_empty() {
            return Err(self.lines.malformed(start, "empty read name"));
        }

        let sequence = self.required_line("sequence")?;

        let separator = self.required_line("separator")?;
        let separator_at = self.lines.line_number();
        if separator.first() != Some(&b'+') {
            return Err(self.lines.malformed(separator_at, "expected a '+' separator line"));
        }
        let echo = String::from_utf8_lossy(&separator[1..]);
        let echo = echo.trim();
        if !echo.is_empty() && echo != header && echo != id {
            return Err(self.lines.malformed(
                separator_at,
                format!("separator '+{echo}' does not match header '{header}'"),
            ));
        }

        let quality = self.required_line("quality")?;
        if quality.first() == Some(&b'@') && quality.len() != sequence.len() {
            return Err(self.lines.malformed(self.lines.line_number(), "missing quality line"));
        }

        Ok(Some(RawRecord::new(start, id, FastqLines { header, sequence, quality })))
    }
}

/// Builds a [`SeqRecord`] from lexed FASTQ lines.
///
/// # Errors
///
/// Fails when sequence and quality lengths differ or the sequence contains a
/// non-nucleotide symbol.
pub fn fastq_transform(record: RawRecord<FastqLines>) -> AnyResult<SeqRecord> {
    let FastqLines { header, mut sequence, quality } = record.payload;
    if sequence.len() != quality.len() {
        bail!(
            "sequence length {} does not match quality length {} (record at line {})",
            sequence.len(),
            quality.len(),
            record.line_number
        );
    }
    if let Some(pos) = SeqType::Nucleotide.first_invalid(&sequence) {
        bail!("invalid nucleotide '{}' at position {}", char::from(sequence[pos]), pos + 1);
    }
    sequence.make_ascii_uppercase();
    let (id, description) = split_header(&header);
    Ok(SeqRecord::new(id, sequence).with_description(description).with_quality(quality))
}
