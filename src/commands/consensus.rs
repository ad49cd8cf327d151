//! Build per-contig consensus sequences from a single-sample GVCF.

use ahash::AHashMap;
use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use seqflow_lib::SeqRecord;
use seqflow_lib::gvcf::{GvcfLexer, gvcf_consensus};
use seqflow_lib::input::{open_input, open_output};
use seqflow_lib::logging::{OperationTimer, format_count};
use seqflow_lib::pipeline::RecordPipeline;
use seqflow_lib::reference::ReferenceGenome;
use seqflow_lib::validation::{validate_files_exist, validate_single_stdin};
use seqflow_lib::writer::FastaWriter;

use crate::commands::command::Command;
use crate::commands::common::{IoOptions, PipelineOptions};

/// Default FASTA line width for consensus output.
const DEFAULT_LINE_WIDTH: usize = 60;

/// Build per-contig consensus sequences from a GVCF.
#[derive(Debug, Parser)]
#[command(
    name = "consensus",
    about = "\x1b[38;5;173m[CONSENSUS]\x1b[0m      \x1b[36mBuild per-contig consensus from a GVCF\x1b[0m",
    long_about = r#"
Build one consensus sequence per contig from a single-sample GVCF.

Records are grouped into runs of consecutive lines on the same contig and each
run is assembled on a worker thread. Reference calls contribute the reference
bases over [POS, END]; alternate calls contribute their allele; deletions (*),
symbolic alleles and no-calls contribute nothing. Only the first allele of the
genotype is used.

A contig whose records are split into several runs is assembled per run and
the runs are concatenated in file order.

EXAMPLES:

  seqflow consensus -i sample.g.vcf.gz -r ref.fa -o consensus.fa -t 8
"#
)]
pub struct Consensus {
    #[command(flatten)]
    pub io: IoOptions,

    /// Reference FASTA the GVCF was called against (plain or gzip).
    #[arg(short = 'r', long = "reference")]
    pub reference: PathBuf,

    /// Wrap FASTA sequence lines at this many bases (0 disables wrapping).
    #[arg(short = 'w', long = "line-width", default_value_t = DEFAULT_LINE_WIDTH)]
    pub line_width: usize,

    #[command(flatten)]
    pub pipeline: PipelineOptions,
}

/// Concatenates consensus runs that share a contig, keeping first-seen contig order.
fn merge_runs(runs: Vec<SeqRecord>) -> Vec<SeqRecord> {
    let mut merged: Vec<SeqRecord> = Vec::with_capacity(runs.len());
    let mut index: AHashMap<String, usize> = AHashMap::new();
    for run in runs {
        match index.get(&run.id) {
            Some(&i) => {
                warn!("Contig '{}' appears in more than one run; concatenating", run.id);
                merged[i].sequence.extend_from_slice(&run.sequence);
            }
            None => {
                index.insert(run.id.clone(), merged.len());
                merged.push(run);
            }
        }
    }
    merged
}

impl Command for Consensus {
    fn execute(&self, _command_line: &str) -> Result<()> {
        let inputs = [(&self.io.input, "Input GVCF"), (&self.reference, "Reference FASTA")];
        validate_single_stdin(&inputs)?;
        validate_files_exist(&inputs)?;
        let reference_config = self.pipeline.pipeline_config("reference")?;
        let config = self.pipeline.pipeline_config("gvcf")?;
        let pool = self.pipeline.worker_pool()?;

        let timer = OperationTimer::new("Building GVCF consensus");
        info!("Input: {}", self.io.input.display());
        info!("Reference: {}", self.reference.display());
        info!("Output: {}", self.io.output.display());
        info!("Threads: {}", pool.num_threads());

        let reference = Arc::new(ReferenceGenome::from_fasta(&self.reference, &pool, reference_config)?);
        info!("Loaded {} reference contigs", reference.len());

        let lexer = GvcfLexer::new(open_input(&self.io.input)?, self.io.input_name())?;
        info!("Sample: {}", lexer.sample());
        let pipeline = RecordPipeline::segmented(lexer, gvcf_consensus(reference), &pool, config)?;

        let runs = match pipeline.read_all_ordered() {
            Ok(runs) => runs,
            Err(partial) => {
                if self.pipeline.is_terminal(&partial.error) {
                    return Err(partial.error).context("Consensus failed");
                }
                if partial.records.is_empty() {
                    bail!("No contig could be assembled: {}", partial.error);
                }
                warn!("{} contig run(s) failed; first error: {}", partial.error_count, partial.error);
                partial.records
            }
        };

        let contigs = merge_runs(runs);
        let mut writer = FastaWriter::new(open_output(&self.io.output)?).with_line_width(Some(self.line_width));
        for contig in &contigs {
            writer.write_record(contig)?;
        }
        let written = writer.written();
        writer.into_inner().finish()?;

        info!("Wrote {} contigs", format_count(written));
        timer.log_completion(written, "contigs");
        Ok(())
    }
}
