//! Sequence alphabets.
//!
//! Byte-level membership tests for the IUPAC nucleotide and amino-acid alphabets.
//! Lookups are case-insensitive; sequences are stored upper-cased.

/// IUPAC nucleotide codes: unambiguous bases, U, ambiguity codes, X and N.
pub const NUCLEOTIDES: &[u8] = b"ACGTUMRWSYKVHDBXN";

/// IUPAC amino-acid codes plus X (ambiguous), `*` (stop) and `-` (gap).
pub const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWYX*-";

/// No-call base.
pub const NO_CALL_BASE: u8 = b'N';

const fn build_table(symbols: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < symbols.len() {
        let upper = symbols[i];
        table[upper as usize] = true;
        table[upper.to_ascii_lowercase() as usize] = true;
        i += 1;
    }
    table
}

static NUCLEOTIDE_TABLE: [bool; 256] = build_table(NUCLEOTIDES);
static AMINO_ACID_TABLE: [bool; 256] = build_table(AMINO_ACIDS);

/// Which alphabet a sequence is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeqType {
    /// DNA or RNA.
    #[default]
    Nucleotide,
    /// Amino acids.
    Protein,
}

impl SeqType {
    /// True if `base` belongs to this alphabet (either case).
    #[inline]
    #[must_use]
    pub fn contains(self, base: u8) -> bool {
        match self {
            SeqType::Nucleotide => NUCLEOTIDE_TABLE[base as usize],
            SeqType::Protein => AMINO_ACID_TABLE[base as usize],
        }
    }

    /// Index of the first byte outside this alphabet, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use seqflow_lib::dna::SeqType;
    ///
    /// assert_eq!(SeqType::Nucleotide.first_invalid(b"ACGTN"), None);
    /// assert_eq!(SeqType::Nucleotide.first_invalid(b"ACZT"), Some(2));
    /// assert_eq!(SeqType::Protein.first_invalid(b"MKV*"), None);
    /// ```
    #[must_use]
    pub fn first_invalid(self, seq: &[u8]) -> Option<usize> {
        seq.iter().position(|&b| !self.contains(b))
    }

    /// Human-readable alphabet name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SeqType::Nucleotide => "nucleotide",
            SeqType::Protein => "protein",
        }
    }
}

/// True for unambiguous nucleotides (A, C, G, T, U), either case.
#[inline]
#[must_use]
pub const fn is_unambiguous_base(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'U')
}
