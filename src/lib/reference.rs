//! Reference genome held in memory.
//!
//! The whole reference is loaded once, through the FASTA pipeline, so the GVCF
//! consensus transform gets O(1) contig lookups from any worker. A
//! [`ReferenceGenome`] is cheap to clone and is passed explicitly to the
//! transforms that need it.

use ahash::AHashMap;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use crate::dna::SeqType;
use crate::errors::SeqflowError;
use crate::fasta::{FastaLexer, fasta_transform};
use crate::input::open_input;
use crate::pipeline::{PipelineConfig, RecordPipeline, WorkerPool};

/// Contig sequences keyed by name, upper-cased.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGenome {
    sequences: Arc<AHashMap<String, Vec<u8>>>,
}

impl ReferenceGenome {
    /// Loads a (possibly gzipped) FASTA reference through a pipeline built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is malformed, contains a
    /// non-nucleotide symbol, or names the same contig twice.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use seqflow_lib::pipeline::{PipelineConfig, WorkerPool};
    /// use seqflow_lib::reference::ReferenceGenome;
    ///
    /// let pool = WorkerPool::new(4)?;
    /// let reference = ReferenceGenome::from_fasta("reference.fa", &pool, PipelineConfig::new("reference"))?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_fasta<P: AsRef<Path>>(path: P, pool: &WorkerPool, config: PipelineConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading reference {}", path.display());
        let reader = open_input(path)?;
        Self::from_reader(reader, path.display().to_string(), pool, config)
            .with_context(|| format!("Failed to load reference {}", path.display()))
    }

    /// Loads a reference from an already opened FASTA stream.
    ///
    /// # Errors
    ///
    /// Same as [`ReferenceGenome::from_fasta`], without the open step.
    pub fn from_reader(
        reader: Box<dyn BufRead + Send>,
        name: impl Into<String>,
        pool: &WorkerPool,
        config: PipelineConfig,
    ) -> std::result::Result<Self, SeqflowError> {
        let lexer = FastaLexer::new(reader, name);
        let pipeline = RecordPipeline::flat(lexer, fasta_transform(SeqType::Nucleotide), pool, config)?;
        let records = pipeline.read_all().map_err(|partial| partial.error)?;
        let sequences: AHashMap<String, Vec<u8>> =
            records.into_iter().map(|(name, record)| (name, record.sequence)).collect();
        debug!("Loaded {} contigs into memory", sequences.len());
        Ok(Self { sequences: Arc::new(sequences) })
    }

    /// Builds a reference from `(name, sequence)` pairs; sequences are upper-cased.
    pub fn from_sequences<I, S>(contigs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let sequences = contigs
            .into_iter()
            .map(|(name, mut sequence)| {
                sequence.make_ascii_uppercase();
                (name.into(), sequence)
            })
            .collect();
        Self { sequences: Arc::new(sequences) }
    }

    /// The full sequence of `contig`.
    #[must_use]
    pub fn get(&self, contig: &str) -> Option<&[u8]> {
        self.sequences.get(contig).map(Vec::as_slice)
    }

    /// True if `contig` is present.
    #[must_use]
    pub fn contains(&self, contig: &str) -> bool {
        self.sequences.contains_key(contig)
    }

    /// Number of contigs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// True if no contigs were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Contig names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sequences.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
