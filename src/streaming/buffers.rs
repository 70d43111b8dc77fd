//! Live-record buffers and I/O buffer sizes.
//!
//! The live buffers hold only the records that may still take part in an
//! overlap with something the cursor has not reached yet. All three are
//! owned by the engine; nothing else mutates them.

use std::collections::btree_map::IterMut;
use std::collections::{BTreeMap, BTreeSet};

use crate::annotation::AnnotationState;
use crate::interval::{GenomicRange, Locus, RegionTarget, Transcript};

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Default input buffer size (256 KB).
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// The three live buffers: intervals with their annotation, transcripts,
/// and the single current region.
///
/// BTree containers keep iteration in coordinate order, so joins and
/// evictions are deterministic.
#[derive(Debug, Default)]
pub struct LiveBuffers {
    intervals: BTreeMap<GenomicRange, AnnotationState>,
    transcripts: BTreeSet<Transcript>,
    region: Option<RegionTarget>,
}

impl LiveBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an interval with a fresh state. Re-observing the same
    /// coordinates keeps the existing state; returns true if it was new.
    pub fn observe_interval(&mut self, range: GenomicRange) -> bool {
        let mut inserted = false;
        self.intervals.entry(range).or_insert_with(|| {
            inserted = true;
            AnnotationState::new()
        });
        inserted
    }

    /// Buffer a transcript; duplicates by full value are ignored.
    pub fn observe_transcript(&mut self, transcript: Transcript) -> bool {
        self.transcripts.insert(transcript)
    }

    /// Make `region` the current region, or clear the slot with `None`.
    pub fn replace_region(&mut self, region: Option<RegionTarget>) {
        self.region = region;
    }

    pub fn region(&self) -> Option<&RegionTarget> {
        self.region.as_ref()
    }

    pub fn transcripts(&self) -> &BTreeSet<Transcript> {
        &self.transcripts
    }

    pub fn annotation(&self, range: &GenomicRange) -> Option<&AnnotationState> {
        self.intervals.get(range)
    }

    /// Mutable access to every buffered interval together with the
    /// transcripts and region it is joined against.
    pub fn join_view(
        &mut self,
    ) -> (
        IterMut<'_, GenomicRange, AnnotationState>,
        &BTreeSet<Transcript>,
        Option<&RegionTarget>,
    ) {
        (
            self.intervals.iter_mut(),
            &self.transcripts,
            self.region.as_ref(),
        )
    }

    /// Drop every transcript the cursor has passed. Returns how many.
    pub fn evict_transcripts(&mut self, cursor: &Locus) -> usize {
        let before = self.transcripts.len();
        self.transcripts.retain(|t| !t.range.is_before(cursor));
        before - self.transcripts.len()
    }

    /// Remove and return every interval the cursor has passed, in
    /// coordinate order.
    pub fn evict_intervals(&mut self, cursor: &Locus) -> Vec<(GenomicRange, AnnotationState)> {
        // Intervals are sorted by (rank, start, end) but eviction depends on
        // end alone, so a prefix split is not enough.
        let expired: Vec<GenomicRange> = self
            .intervals
            .keys()
            .take_while(|r| r.start_locus() <= *cursor)
            .filter(|r| r.is_before(cursor))
            .cloned()
            .collect();

        expired
            .into_iter()
            .filter_map(|range| self.intervals.remove_entry(&range))
            .collect()
    }

    /// Clear the region slot once the cursor has passed it.
    pub fn evict_region(&mut self, cursor: &Locus) -> bool {
        match &self.region {
            Some(region) if region.range.is_before(cursor) => {
                self.region = None;
                true
            }
            _ => false,
        }
    }

    /// Remove every remaining interval, in coordinate order.
    pub fn drain_intervals(&mut self) -> Vec<(GenomicRange, AnnotationState)> {
        std::mem::take(&mut self.intervals).into_iter().collect()
    }

    /// Forget all transcripts and the current region.
    pub fn clear_references(&mut self) {
        self.transcripts.clear();
        self.region = None;
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn transcript_count(&self) -> usize {
        self.transcripts.len()
    }

    /// Number of live records across all buffers.
    pub fn live_count(&self) -> usize {
        self.intervals.len() + self.transcripts.len() + usize::from(self.region.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::GeneOrigin;

    fn range(start: u64, end: u64) -> GenomicRange {
        GenomicRange::new("chr1", 0, start, end).unwrap()
    }

    #[test]
    fn test_observe_interval_is_idempotent() {
        let mut buffers = LiveBuffers::new();
        assert!(buffers.observe_interval(range(100, 200)));

        {
            let (mut intervals, _, _) = buffers.join_view();
            let (_, state) = intervals.next().unwrap();
            state
                .update("geneA", GeneOrigin::Transcript, Vec::new())
                .unwrap();
        }

        assert!(!buffers.observe_interval(range(100, 200)));
        assert_eq!(buffers.interval_count(), 1);
        assert!(buffers.annotation(&range(100, 200)).unwrap().contains("geneA"));
    }

    #[test]
    fn test_transcript_set_semantics() {
        let mut buffers = LiveBuffers::new();
        let a = Transcript::new("geneA", "NM_1", range(100, 500), vec![range(100, 150)]);
        let b = Transcript::new("geneB", "NM_2", range(100, 500), vec![range(100, 150)]);

        assert!(buffers.observe_transcript(a.clone()));
        assert!(!buffers.observe_transcript(a));
        // Same range, different gene: both kept
        assert!(buffers.observe_transcript(b));
        assert_eq!(buffers.transcript_count(), 2);
    }

    #[test]
    fn test_evict_intervals_by_end() {
        let mut buffers = LiveBuffers::new();
        buffers.observe_interval(range(100, 1000));
        buffers.observe_interval(range(150, 200));
        buffers.observe_interval(range(300, 400));

        let evicted = buffers.evict_intervals(&Locus::new(0, 250));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].0, range(150, 200));
        assert_eq!(buffers.interval_count(), 2);

        let evicted = buffers.evict_intervals(&Locus::new(1, 1));
        assert_eq!(evicted.len(), 2);
        assert_eq!(evicted[0].0, range(100, 1000));
    }

    #[test]
    fn test_evict_transcripts_and_region() {
        let mut buffers = LiveBuffers::new();
        buffers.observe_transcript(Transcript::new("g", "t", range(1, 50), Vec::new()));
        buffers.observe_transcript(Transcript::new("h", "u", range(1, 500), Vec::new()));
        buffers.replace_region(Some(RegionTarget {
            range: range(10, 20),
            gene_key: "X".to_string(),
            exon_number: 0,
        }));

        assert_eq!(buffers.evict_transcripts(&Locus::new(0, 51)), 1);
        assert!(buffers.evict_region(&Locus::new(0, 51)));
        assert!(buffers.region().is_none());
        assert_eq!(buffers.live_count(), 1);
    }
}
