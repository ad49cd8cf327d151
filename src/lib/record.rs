//! Parsed sequence records.

use crate::dna::SeqType;

/// Values that carry a lookup key, used when collecting results into a map.
pub trait Keyed {
    /// The record id or group key.
    fn key(&self) -> &str;
}

/// A fully parsed sequence: a read, a FASTA entry, or a per-contig consensus.
///
/// Sequence bytes are upper-cased ASCII. Quality, when present, has the same
/// length as the sequence and holds the raw (Phred+33) bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    /// First whitespace-delimited token of the header.
    pub id: String,
    /// Rest of the header after the id, if any.
    pub description: Option<String>,
    /// Residues.
    pub sequence: Vec<u8>,
    /// Per-base qualities (FASTQ only).
    pub quality: Option<Vec<u8>>,
    /// Alphabet the sequence was validated against.
    pub seq_type: SeqType,
}

impl SeqRecord {
    /// Creates a nucleotide record without qualities.
    #[must_use]
    pub fn new(id: impl Into<String>, sequence: Vec<u8>) -> Self {
        Self { id: id.into(), description: None, sequence, quality: None, seq_type: SeqType::Nucleotide }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the qualities.
    #[must_use]
    pub fn with_quality(mut self, quality: Vec<u8>) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Sets the alphabet.
    #[must_use]
    pub fn with_seq_type(mut self, seq_type: SeqType) -> Self {
        self.seq_type = seq_type;
        self
    }

    /// Number of residues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// True for an empty sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The sequence as text.
    #[must_use]
    pub fn sequence_str(&self) -> &str {
        // Sequences are validated against an ASCII alphabet on construction.
        std::str::from_utf8(&self.sequence).unwrap_or_default()
    }

    /// The header line without its leading marker (`id description`).
    #[must_use]
    pub fn header(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {description}", self.id),
            None => self.id.clone(),
        }
    }
}

impl Keyed for SeqRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Splits a header (without marker) into id and optional description.
///
/// # Examples
///
/// ```
/// use seqflow_lib::record::split_header;
///
/// assert_eq!(split_header("r1 lane=3"), ("r1".to_string(), Some("lane=3".to_string())));
/// assert_eq!(split_header("r2"), ("r2".to_string(), None));
/// ```
#[must_use]
pub fn split_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, rest)) => {
            let rest = rest.trim();
            (id.to_string(), if rest.is_empty() { None } else { Some(rest.to_string()) })
        }
        None => (header.to_string(), None),
    }
}
