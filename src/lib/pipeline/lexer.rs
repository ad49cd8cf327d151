//! Sequential record discovery.
//!
//! A [`RecordLexer`] walks an input once, front to back, and turns lines into
//! [`RawRecord`]s according to a format grammar. The pipeline runs exactly one
//! lexer per instance on a dedicated thread; record boundaries and line numbers
//! depend on every line before them, so this step is never parallelized.

use std::io::BufRead;

use crate::errors::{Result, SeqflowError};

/// One record as discovered by a lexer, before any expensive transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord<P> {
    /// 1-based line number where the record starts.
    pub line_number: u64,
    /// Record id (flat formats) or group key such as a chromosome (segmented formats).
    pub key: String,
    /// The record's lines in structured form.
    pub payload: P,
}

impl<P> RawRecord<P> {
    /// Creates a raw record.
    pub fn new(line_number: u64, key: impl Into<String>, payload: P) -> Self {
        Self { line_number, key: key.into(), payload }
    }
}

/// A format grammar that produces records strictly in file order.
///
/// Implementations own their reader. A lexer is not restartable: once it returns
/// `Ok(None)` or an error it must not be polled again.
pub trait RecordLexer: Send + 'static {
    /// Structured lines of a single record.
    type Payload: Send + 'static;

    /// Name of the input, used in error messages.
    fn source_name(&self) -> &str;

    /// Returns the next record, `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`SeqflowError::MalformedInput`] on any structural violation or
    /// unreadable line.
    fn next_record(&mut self) -> Result<Option<RawRecord<Self::Payload>>>;
}

/// Line reader that tracks 1-based line numbers and supports one line of look-ahead.
///
/// Line terminators (`\n` or `\r\n`) are stripped. The underlying cursor only
/// moves forward.
pub struct LineSource {
    reader: Box<dyn BufRead + Send>,
    name: String,
    buf: Vec<u8>,
    line_number: u64,
    replay: bool,
    eof: bool,
}

impl LineSource {
    /// Wraps a reader; `name` is reported in errors.
    pub fn new(reader: Box<dyn BufRead + Send>, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            buf: Vec::with_capacity(256),
            line_number: 0,
            replay: false,
            eof: false,
        }
    }

    /// Reads the next line, `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`SeqflowError::MalformedInput`] if the line cannot be read.
    pub fn next_line(&mut self) -> Result<Option<&[u8]>> {
        if self.replay {
            self.replay = false;
            self.line_number += 1;
            return Ok(Some(self.buf.as_slice()));
        }
        if self.eof {
            return Ok(None);
        }

        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf).map_err(|e| {
            SeqflowError::malformed(&self.name, self.line_number + 1, format!("unreadable line: {e}"))
        })?;
        if read == 0 {
            self.eof = true;
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        self.line_number += 1;
        Ok(Some(self.buf.as_slice()))
    }

    /// Pushes the most recently returned line back so the next call returns it again.
    pub fn unread(&mut self) {
        debug_assert!(!self.replay, "only one line of look-ahead is supported");
        if self.line_number > 0 {
            self.replay = true;
            self.line_number -= 1;
        }
    }

    /// Line number of the most recently returned line (0 before the first read).
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Name of the input.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a malformed-input error for this source.
    #[must_use]
    pub fn malformed(&self, line: u64, reason: impl Into<String>) -> SeqflowError {
        SeqflowError::malformed(&self.name, line, reason)
    }
}
