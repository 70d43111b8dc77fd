//! Core coordinate types: ranges, the reference cursor and the records
//! that flow through the engine.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{AnnotateError, Result};
use crate::streaming::parsing::parse_region_label;

/// A genomic range on a ranked contig.
/// Uses 1-based, inclusive coordinates.
///
/// `rank` is the contig's position in the sequence dictionary and drives
/// the total order; the contig name is only compared to break ties between
/// ranges that could not otherwise be distinguished.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicRange {
    pub contig: String,
    pub rank: u32,
    pub start: u64,
    pub end: u64,
}

impl GenomicRange {
    /// Create a new range, rejecting `start > end`.
    pub fn new(contig: impl Into<String>, rank: u32, start: u64, end: u64) -> Result<Self> {
        let contig = contig.into();
        if start > end {
            return Err(AnnotateError::InvalidRange { contig, start, end });
        }
        Ok(Self {
            contig,
            rank,
            start,
            end,
        })
    }

    /// Number of bases covered.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Inclusive ranges always cover at least one base.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if this range shares at least one base with another.
    #[inline]
    pub fn overlaps(&self, other: &GenomicRange) -> bool {
        self.rank == other.rank
            && self.contig == other.contig
            && self.start <= other.end
            && other.start <= self.end
    }

    /// True once the cursor has moved strictly past this range's end.
    ///
    /// Ranges on an earlier contig are always before the cursor.
    #[inline]
    pub fn is_before(&self, cursor: &Locus) -> bool {
        self.rank < cursor.rank || (self.rank == cursor.rank && self.end < cursor.pos)
    }

    /// Locus of the first base.
    #[inline]
    pub fn start_locus(&self) -> Locus {
        Locus::new(self.rank, self.start)
    }
}

impl fmt::Display for GenomicRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

impl Ord for GenomicRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
            .then_with(|| self.contig.cmp(&other.contig))
    }
}

impl PartialOrd for GenomicRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Position of the reference cursor: contig rank and 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locus {
    pub rank: u32,
    pub pos: u64,
}

impl Locus {
    #[inline]
    pub fn new(rank: u32, pos: u64) -> Self {
        Self { rank, pos }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.rank, self.pos)
    }
}

/// Anything placed on the reference by a single range.
pub trait Located {
    fn range(&self) -> &GenomicRange;
}

impl Located for GenomicRange {
    #[inline]
    fn range(&self) -> &GenomicRange {
        self
    }
}

impl Located for Transcript {
    #[inline]
    fn range(&self) -> &GenomicRange {
        &self.range
    }
}

impl Located for Region {
    #[inline]
    fn range(&self) -> &GenomicRange {
        &self.range
    }
}

/// An exon found inside a queried range, with its exon number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExonHit {
    pub range: GenomicRange,
    pub number: u32,
}

impl ExonHit {
    pub fn new(range: GenomicRange, number: u32) -> Self {
        Self { range, number }
    }
}

/// A gene model: one transcript with its exons in ascending genomic order.
///
/// Field order matters: the derived ordering sorts by transcript range first,
/// which keeps the live transcript set in coordinate order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transcript {
    pub range: GenomicRange,
    pub gene_name: String,
    pub name: String,
    pub exons: Vec<GenomicRange>,
}

impl Transcript {
    pub fn new(
        gene_name: impl Into<String>,
        name: impl Into<String>,
        range: GenomicRange,
        exons: Vec<GenomicRange>,
    ) -> Self {
        Self {
            range,
            gene_name: gene_name.into(),
            name: name.into(),
            exons,
        }
    }

    /// Exons overlapping `range`, numbered from zero in genomic order.
    pub fn exons_within(&self, range: &GenomicRange) -> Vec<ExonHit> {
        self.exons
            .iter()
            .enumerate()
            .filter(|(_, exon)| exon.overlaps(range))
            .map(|(i, exon)| ExonHit::new(exon.clone(), i as u32))
            .collect()
    }
}

/// An auxiliary target region with its free-text label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub range: GenomicRange,
    pub label: String,
}

impl Region {
    pub fn new(range: GenomicRange, label: impl Into<String>) -> Self {
        Self {
            range,
            label: label.into(),
        }
    }

    /// Split the label into the gene key and the zero-based exon number.
    pub fn target(&self) -> Result<RegionTarget> {
        let (gene_key, exon_number) = parse_region_label(&self.label)?;
        Ok(RegionTarget {
            range: self.range.clone(),
            gene_key: gene_key.to_string(),
            exon_number,
        })
    }
}

/// A region whose label has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTarget {
    pub range: GenomicRange,
    pub gene_key: String,
    pub exon_number: u32,
}

impl RegionTarget {
    /// Gene label attached to intervals, e.g. `TCGA_TCGA6K`.
    pub fn gene_label(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.gene_key)
    }

    /// The single exon this region contributes.
    pub fn exon_hit(&self) -> ExonHit {
        ExonHit::new(self.range.clone(), self.exon_number)
    }
}
