//! Opening inputs and outputs.
//!
//! Inputs may be plain text or gzip (detected from the first two bytes, not the
//! file name), and `-` reads standard input. Outputs ending in `.gz` are gzip
//! compressed; `-` writes to standard output.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::validation::is_stdin_path;

/// Read/write buffer size.
pub const BUFFER_SIZE: usize = 64 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression of an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Uncompressed text.
    Plain,
    /// Gzip, possibly several concatenated members.
    Gzip,
}

/// Peeks at the buffered head of `reader` without consuming it.
///
/// # Errors
///
/// Returns an error if the reader cannot be filled.
pub fn detect_compression<R: BufRead>(reader: &mut R) -> io::Result<CompressionFormat> {
    let head = reader.fill_buf()?;
    if head.starts_with(&GZIP_MAGIC) {
        Ok(CompressionFormat::Gzip)
    } else {
        Ok(CompressionFormat::Plain)
    }
}

/// Wraps any byte source as a line reader, decompressing it if it is gzip.
///
/// # Errors
///
/// Returns an error if the head of the stream cannot be read.
pub fn buffered_reader<R: Read + Send + 'static>(inner: R) -> io::Result<Box<dyn BufRead + Send>> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, inner);
    match detect_compression(&mut reader)? {
        CompressionFormat::Gzip => {
            debug!("Detected gzip-compressed input");
            Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, MultiGzDecoder::new(reader))))
        }
        CompressionFormat::Plain => Ok(Box::new(reader)),
    }
}

/// Opens `path` (or stdin for `-`) for line reading.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    if is_stdin_path(path) {
        debug!("Reading from standard input");
        return buffered_reader(io::stdin()).context("Failed to read standard input");
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    buffered_reader(file).with_context(|| format!("Failed to read {}", path.display()))
}

/// A buffered output that may be gzip compressed.
///
/// Call [`OutputSink::finish`] so that write errors on the final flush are
/// reported and the gzip trailer is written.
pub enum OutputSink {
    /// Uncompressed.
    Plain(BufWriter<Box<dyn Write + Send>>),
    /// Gzip compressed.
    Gzip(GzEncoder<BufWriter<Box<dyn Write + Send>>>),
}

impl OutputSink {
    /// Flushes and, for gzip, terminates the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub fn finish(self) -> Result<()> {
        match self {
            OutputSink::Plain(mut writer) => writer.flush().context("Failed to flush output"),
            OutputSink::Gzip(writer) => {
                let mut inner = writer.finish().context("Failed to finish gzip stream")?;
                inner.flush().context("Failed to flush output")
            }
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Plain(writer) => writer.write(buf),
            OutputSink::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Plain(writer) => writer.flush(),
            OutputSink::Gzip(writer) => writer.flush(),
        }
    }
}

/// Creates `path` (or uses stdout for `-`) for writing; a `.gz` suffix selects gzip.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn open_output<P: AsRef<Path>>(path: P) -> Result<OutputSink> {
    let path = path.as_ref();
    let inner: Box<dyn Write + Send> = if is_stdin_path(path) {
        Box::new(io::stdout())
    } else {
        Box::new(File::create(path).with_context(|| format!("Failed to create {}", path.display()))?)
    };
    let buffered = BufWriter::with_capacity(BUFFER_SIZE, inner);
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(OutputSink::Gzip(GzEncoder::new(buffered, Compression::default())))
    } else {
        Ok(OutputSink::Plain(buffered))
    }
}
