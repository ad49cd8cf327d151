//! FASTA and FASTQ serializers for [`SeqRecord`]s.
//!
//! Both writers wrap any [`Write`]; pair them with [`crate::input::open_output`]
//! for files, stdout or gzip.

use anyhow::{Result, bail};
use std::io::Write;

use crate::record::SeqRecord;

/// Writes records as FASTA, optionally wrapping sequence lines.
///
/// # Examples
///
/// ```
/// use seqflow_lib::record::SeqRecord;
/// use seqflow_lib::writer::FastaWriter;
///
/// let mut writer = FastaWriter::new(Vec::new()).with_line_width(Some(4));
/// writer.write_record(&SeqRecord::new("chr1", b"ACGTAC".to_vec())).unwrap();
/// assert_eq!(writer.into_inner(), b">chr1\nACGT\nAC\n");
/// ```
pub struct FastaWriter<W: Write> {
    inner: W,
    line_width: Option<usize>,
    written: u64,
}

impl<W: Write> FastaWriter<W> {
    /// Creates a writer that puts each sequence on a single line.
    pub fn new(inner: W) -> Self {
        Self { inner, line_width: None, written: 0 }
    }

    /// Wraps sequence lines at `width` residues; `None` or zero disables wrapping.
    #[must_use]
    pub fn with_line_width(mut self, width: Option<usize>) -> Self {
        self.line_width = width.filter(|&w| w > 0);
        self
    }

    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_record(&mut self, record: &SeqRecord) -> Result<()> {
        writeln!(self.inner, ">{}", record.header())?;
        match self.line_width {
            Some(width) => {
                for chunk in record.sequence.chunks(width) {
                    self.inner.write_all(chunk)?;
                    self.inner.write_all(b"\n")?;
                }
            }
            None => {
                self.inner.write_all(&record.sequence)?;
                self.inner.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Writes records as four-line FASTQ.
pub struct FastqWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> FastqWriter<W> {
    /// Creates a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Writes one record with an empty `+` separator.
    ///
    /// # Errors
    ///
    /// Fails if the record has no qualities, or if the underlying writer fails.
    pub fn write_record(&mut self, record: &SeqRecord) -> Result<()> {
        let Some(quality) = &record.quality else {
            bail!("Record '{}' has no qualities and cannot be written as FASTQ", record.id);
        };
        writeln!(self.inner, "@{}", record.header())?;
        self.inner.write_all(&record.sequence)?;
        self.inner.write_all(b"\n+\n")?;
        self.inner.write_all(quality)?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
