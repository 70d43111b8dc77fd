//! Streaming merge-join of intervals against gene models and target regions.
//!
//! # Algorithm
//!
//! The caller advances a reference cursor in non-decreasing coordinate order
//! and hands over, at each step, the records that became visible there:
//!
//! 1. Ingest the batch into the live buffers (intervals and transcripts are
//!    deduplicated, the newest region replaces the current one)
//! 2. Join every live interval with every live transcript that overlaps it
//!    and whose gene is not yet attached
//! 3. Join the current region with every interval it overlaps
//! 4. Evict transcripts, intervals and the region the cursor has passed;
//!    evicted intervals go to the sink, each exactly once
//!
//! The join is a nested loop over the live window. Both buffers stay small
//! because eviction runs on every step.
//!
//! # Memory Complexity
//!
//! O(k) where k = the number of intervals and transcripts spanning any
//! single position. A transcript covering a whole chromosome stays live
//! until the cursor leaves that chromosome.
//!
//! # Requirements
//!
//! Every stream MUST be delivered in non-decreasing order of the shared
//! sequence dictionary. Out-of-order records are missed silently; the
//! traversal driver validates order before records reach the engine.

use log::{debug, warn};

use crate::annotation::GeneOrigin;
use crate::config::AnnotateConfig;
use crate::error::{AnnotateError, Result};
use crate::interval::{GenomicRange, Locus, Region, Transcript};
use crate::streaming::buffers::LiveBuffers;
use crate::streaming::output::AnnotationSink;

/// Records that became visible at one cursor position.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub intervals: Vec<GenomicRange>,
    pub transcripts: Vec<Transcript>,
    pub regions: Vec<Region>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, range: GenomicRange) -> Self {
        self.intervals.push(range);
        self
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcripts.push(transcript);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }
}

/// The merge-join engine for one pass. Owns the cursor and all live state.
#[derive(Debug)]
pub struct AnnotationEngine {
    config: AnnotateConfig,
    buffers: LiveBuffers,
    cursor: Option<Locus>,
    stats: EngineStats,
    warned_large_window: bool,
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new(AnnotateConfig::default())
    }
}

impl AnnotationEngine {
    pub fn new(config: AnnotateConfig) -> Self {
        Self {
            config,
            buffers: LiveBuffers::new(),
            cursor: None,
            stats: EngineStats::default(),
            warned_large_window: false,
        }
    }

    /// Move the cursor to `cursor`, ingest `batch`, join and evict.
    ///
    /// Returns the number of transcript annotations made during the join.
    pub fn advance<S: AnnotationSink>(
        &mut self,
        cursor: Locus,
        batch: Batch,
        sink: &mut S,
    ) -> Result<u64> {
        if let Some(previous) = self.cursor {
            if cursor < previous {
                return Err(AnnotateError::CursorRegression {
                    from: previous.to_string(),
                    to: cursor.to_string(),
                });
            }
        }
        self.cursor = Some(cursor);
        self.stats.advances += 1;

        self.ingest(batch);
        let updated = self.join()?;
        self.evict(&cursor, sink)?;
        Ok(updated)
    }

    /// Emit every interval still buffered and reset the live state.
    ///
    /// Returns the number of intervals emitted.
    pub fn finish<S: AnnotationSink>(&mut self, sink: &mut S) -> Result<usize> {
        let remaining = self.buffers.drain_intervals();
        let count = remaining.len();
        for (range, state) in &remaining {
            sink.emit(range, state)?;
        }
        self.buffers.clear_references();
        self.stats.intervals_emitted += count;
        debug!("Flushed {} intervals at end of input", count);
        Ok(count)
    }

    fn ingest(&mut self, batch: Batch) {
        for range in batch.intervals {
            if self.buffers.observe_interval(range) {
                self.stats.intervals += 1;
            }
        }

        for transcript in batch.transcripts {
            if self.buffers.observe_transcript(transcript) {
                self.stats.transcripts += 1;
            }
        }

        for region in batch.regions {
            self.stats.regions += 1;
            match region.target() {
                Ok(target) => self.buffers.replace_region(Some(target)),
                Err(e) => {
                    warn!("{}; skipping region {}", e, region.range);
                    self.stats.malformed_regions += 1;
                    self.buffers.replace_region(None);
                }
            }
        }

        let live = self.buffers.live_count();
        self.stats.max_live = self.stats.max_live.max(live);
        if !self.warned_large_window && live > self.config.window_warning_threshold {
            warn!(
                "Large live window detected ({} records). Very long transcripts or intervals keep records buffered",
                live
            );
            self.warned_large_window = true;
        }
    }

    fn join(&mut self) -> Result<u64> {
        let prefix = self.config.region_prefix.as_str();
        let (intervals, transcripts, region) = self.buffers.join_view();
        let region = region.map(|r| (r, r.gene_label(prefix)));

        let mut updated = 0u64;
        let mut region_updated = 0usize;

        for (range, state) in intervals {
            for transcript in transcripts {
                if !range.overlaps(&transcript.range) || state.contains(&transcript.gene_name) {
                    continue;
                }
                let origin = GeneOrigin::classify(&transcript.gene_name, prefix);
                state
                    .update(&transcript.gene_name, origin, transcript.exons_within(range))
                    .map_err(|e| with_interval(e, range))?;
                updated += 1;
            }

            if let Some((target, label)) = &region {
                if range.overlaps(&target.range)
                    && !state.has_exon_number(label, target.exon_number)
                {
                    let origin = GeneOrigin::classify(label, prefix);
                    state
                        .update(label, origin, vec![target.exon_hit()])
                        .map_err(|e| with_interval(e, range))?;
                    region_updated += 1;
                }
            }
        }

        self.stats.transcript_updates += updated;
        self.stats.region_updates += region_updated;
        Ok(updated)
    }

    fn evict<S: AnnotationSink>(&mut self, cursor: &Locus, sink: &mut S) -> Result<()> {
        self.buffers.evict_transcripts(cursor);
        self.buffers.evict_region(cursor);

        let expired = self.buffers.evict_intervals(cursor);
        for (range, state) in &expired {
            sink.emit(range, state)?;
        }
        self.stats.intervals_emitted += expired.len();
        Ok(())
    }

    pub fn buffers(&self) -> &LiveBuffers {
        &self.buffers
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}

/// Name the offending interval in a duplicate-annotation error.
fn with_interval(err: AnnotateError, range: &GenomicRange) -> AnnotateError {
    match err {
        AnnotateError::DuplicateAnnotation { gene, .. } => AnnotateError::DuplicateAnnotation {
            interval: range.to_string(),
            gene,
        },
        other => other,
    }
}

/// Counters collected over one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub advances: usize,
    pub intervals: usize,
    pub transcripts: usize,
    pub regions: usize,
    pub malformed_regions: usize,
    pub transcript_updates: u64,
    pub region_updates: usize,
    pub intervals_emitted: usize,
    pub max_live: usize,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Intervals: {}, Transcripts: {}, Regions: {} ({} malformed), Gene updates: {}, Region updates: {}, Emitted: {}, Max live: {}",
            self.intervals,
            self.transcripts,
            self.regions,
            self.malformed_regions,
            self.transcript_updates,
            self.region_updates,
            self.intervals_emitted,
            self.max_live
        )
    }
}
