//! Grouping of consecutive same-key records into segments.
//!
//! In grouped mode the dispatcher routes every raw record through a [`Segmenter`].
//! A segment is a maximal run of consecutive records that share a group key (for
//! a GVCF, a chromosome). Segments are handed to the aggregate transform only once
//! they are complete: when the key changes, or at end of input.
//!
//! A key that reappears later in the input starts a new segment; grouping is by
//! adjacency, never by global key.

use super::lexer::RawRecord;

/// A closed run of same-key records, in file order.
#[derive(Debug)]
pub struct Segment<P> {
    group_key: String,
    ordinal: u64,
    first_line: u64,
    records: Vec<RawRecord<P>>,
}

impl<P> Segment<P> {
    /// The key shared by every member.
    #[must_use]
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    /// Submission-order index of this segment.
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Line number of the first member.
    #[must_use]
    pub fn first_line(&self) -> u64 {
        self.first_line
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a segment produced by a [`Segmenter`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Members in file order.
    #[must_use]
    pub fn records(&self) -> &[RawRecord<P>] {
        &self.records
    }

    /// Consumes the segment, yielding its members in file order.
    #[must_use]
    pub fn into_records(self) -> Vec<RawRecord<P>> {
        self.records
    }
}

impl<P> IntoIterator for Segment<P> {
    type Item = RawRecord<P>;
    type IntoIter = std::vec::IntoIter<RawRecord<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

enum SegmenterState<P> {
    NoActiveSegment,
    Active(Segment<P>),
}

/// State machine that turns a record stream into a segment stream.
pub struct Segmenter<P> {
    state: SegmenterState<P>,
    next_ordinal: u64,
}

impl<P> Default for Segmenter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Segmenter<P> {
    /// Creates a segmenter with no active segment.
    #[must_use]
    pub fn new() -> Self {
        Self { state: SegmenterState::NoActiveSegment, next_ordinal: 0 }
    }

    /// Routes one record.
    ///
    /// Returns the previous segment when `record` starts a new one.
    pub fn accept(&mut self, record: RawRecord<P>) -> Option<Segment<P>> {
        match std::mem::replace(&mut self.state, SegmenterState::NoActiveSegment) {
            SegmenterState::NoActiveSegment => {
                self.state = SegmenterState::Active(self.open(record));
                None
            }
            SegmenterState::Active(mut segment) if segment.group_key == record.key => {
                segment.records.push(record);
                self.state = SegmenterState::Active(segment);
                None
            }
            SegmenterState::Active(segment) => {
                self.state = SegmenterState::Active(self.open(record));
                Some(segment)
            }
        }
    }

    /// Closes and returns the active segment at end of input.
    pub fn finish(&mut self) -> Option<Segment<P>> {
        match std::mem::replace(&mut self.state, SegmenterState::NoActiveSegment) {
            SegmenterState::Active(segment) => Some(segment),
            SegmenterState::NoActiveSegment => None,
        }
    }

    /// Key of the active segment, if any.
    #[must_use]
    pub fn current_key(&self) -> Option<&str> {
        match &self.state {
            SegmenterState::Active(segment) => Some(&segment.group_key),
            SegmenterState::NoActiveSegment => None,
        }
    }

    /// Number of segments opened so far.
    #[must_use]
    pub fn segments_opened(&self) -> u64 {
        self.next_ordinal
    }

    fn open(&mut self, record: RawRecord<P>) -> Segment<P> {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        Segment {
            group_key: record.key.clone(),
            ordinal,
            first_line: record.line_number,
            records: vec![record],
        }
    }
}
