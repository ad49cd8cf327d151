//! Convert FASTQ to FASTA.
//!
//! Reads are parsed through the flat pipeline and written in input order.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use seqflow_lib::fastq::{FastqLexer, fastq_transform};
use seqflow_lib::input::{open_input, open_output};
use seqflow_lib::logging::{OperationTimer, format_count};
use seqflow_lib::pipeline::RecordPipeline;
use seqflow_lib::writer::FastaWriter;

use crate::commands::command::Command;
use crate::commands::common::{IoOptions, PipelineOptions};

/// Convert FASTQ to FASTA.
#[derive(Debug, Parser)]
#[command(
    name = "fastq-to-fasta",
    about = "\x1b[38;5;180m[CONVERSION]\x1b[0m     \x1b[36mConvert FASTQ reads to FASTA\x1b[0m",
    long_about = r#"
Convert a FASTQ file (plain or gzip) to FASTA, preserving read order.

Each read is validated on a worker thread: its quality line must match the
sequence length and its bases must be IUPAC nucleotide codes. Reads that fail
validation are skipped with a warning unless --fail-fast is given. A malformed
record (for example a missing separator or quality line) stops the conversion
after all reads before it have been written.

EXAMPLES:

  # Convert with 8 worker threads
  seqflow fastq-to-fasta -i reads.fq.gz -o reads.fa -t 8

  # Wrap sequence lines at 60 bases, stop at the first bad read
  seqflow fastq-to-fasta -i reads.fq -o reads.fa --line-width 60 --fail-fast
"#
)]
pub struct FastqToFasta {
    #[command(flatten)]
    pub io: IoOptions,

    /// Wrap FASTA sequence lines at this many bases (default: no wrapping).
    #[arg(short = 'w', long = "line-width")]
    pub line_width: Option<usize>,

    #[command(flatten)]
    pub pipeline: PipelineOptions,
}

impl Command for FastqToFasta {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.io.validate("Input FASTQ")?;
        let config = self.pipeline.pipeline_config("fastq")?;
        let pool = self.pipeline.worker_pool()?;

        let timer = OperationTimer::new("Converting FASTQ to FASTA");
        info!("Input: {}", self.io.input.display());
        info!("Output: {}", self.io.output.display());
        info!("Threads: {}", pool.num_threads());
        info!("Error policy: {}", config.error_policy);

        let lexer = FastqLexer::new(open_input(&self.io.input)?, self.io.input_name());
        let pipeline = RecordPipeline::flat(lexer, fastq_transform, &pool, config)?;
        let mut writer = FastaWriter::new(open_output(&self.io.output)?).with_line_width(self.line_width);

        let mut skipped = 0u64;
        let mut terminal = None;
        for result in pipeline {
            match result {
                Ok(record) => writer.write_record(&record)?,
                Err(e) if self.pipeline.is_terminal(&e) => {
                    terminal = Some(e);
                    break;
                }
                Err(e) => {
                    warn!("Skipping read: {e}");
                    skipped += 1;
                }
            }
        }

        let written = writer.written();
        writer.into_inner().finish()?;
        if let Some(e) = terminal {
            return Err(e).with_context(|| {
                format!("Conversion stopped after {} reads", format_count(written))
            });
        }

        if skipped > 0 {
            warn!("Skipped {} reads that failed validation", format_count(skipped));
        }
        timer.log_completion(written, "reads");
        Ok(())
    }
}
