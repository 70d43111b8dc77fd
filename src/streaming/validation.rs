//! Sort validation for the input streams.
//!
//! The engine evicts a record as soon as the cursor passes its end, so a
//! record arriving out of order would silently miss overlaps. Each stream
//! is checked inline as records are read:
//!
//! 1. Contigs appear in sequence-dictionary order
//! 2. Within a contig, start positions are non-decreasing

use crate::error::{AnnotateError, Result};
use crate::interval::{GenomicRange, Locus};

/// Inline order validator for one stream.
#[derive(Debug)]
pub struct StreamOrderValidator {
    stream: String,
    prev: Option<(Locus, String)>,
    record_count: usize,
}

impl StreamOrderValidator {
    /// Create a validator; `stream` names the input in error messages.
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            prev: None,
            record_count: 0,
        }
    }

    /// Validate that the given record maintains dictionary order.
    #[inline]
    pub fn validate(&mut self, range: &GenomicRange) -> Result<()> {
        self.record_count += 1;
        let locus = range.start_locus();

        if let Some((prev, prev_contig)) = &self.prev {
            if locus.rank < prev.rank {
                return Err(AnnotateError::UnsortedInput {
                    stream: self.stream.clone(),
                    message: format!(
                        "contig '{}' at record {} should come before '{}' in dictionary order",
                        range.contig, self.record_count, prev_contig
                    ),
                });
            }
            if locus.rank == prev.rank && locus.pos < prev.pos {
                return Err(AnnotateError::UnsortedInput {
                    stream: self.stream.clone(),
                    message: format!(
                        "position {} at record {} comes after {} on {}",
                        range.start, self.record_count, prev.pos, range.contig
                    ),
                });
            }
        }

        self.prev = Some((locus, range.contig.clone()));
        Ok(())
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}
