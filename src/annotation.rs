//! Per-interval annotation state.
//!
//! Each buffered interval owns one [`AnnotationState`] collecting the genes
//! that overlap it and, per gene, the exons seen so far.

use std::fmt;

use crate::error::{AnnotateError, Result};
use crate::interval::{ExonHit, GenomicRange};

/// Literal rendered for intervals that no gene or region touched.
pub const UNKNOWN: &str = "Unknown";

/// Literal rendered for a gene that overlaps without any exon.
pub const INTRON_UTR: &str = "Intron/UTR";

/// Kind of gene label, decided by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneOrigin {
    /// A plain gene name; may be attached once per interval.
    Transcript,
    /// A label carrying the region prefix; may gain further exons.
    Region,
}

impl GeneOrigin {
    /// Labels starting with `region_prefix` are region labels, whichever
    /// record they were read from.
    pub fn classify(label: &str, region_prefix: &str) -> Self {
        if label.starts_with(region_prefix) {
            GeneOrigin::Region
        } else {
            GeneOrigin::Transcript
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GeneEntry {
    label: String,
    origin: GeneOrigin,
    exons: Vec<ExonHit>,
}

/// Genes and exons accumulated for one interval.
///
/// Genes keep insertion order and each label appears once. Exon ranges and
/// exon numbers are stored as pairs so the two views never drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationState {
    genes: Vec<GeneEntry>,
}

impl AnnotationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `label` with the exons it contributes.
    ///
    /// A region label that is already attached only gains exons whose
    /// number is not yet recorded. Any other repeat is an error. The origin
    /// is stored from the first update; callers classify labels with
    /// [`GeneOrigin::classify`] so a label always gets the same origin.
    pub fn update(&mut self, label: &str, origin: GeneOrigin, exons: Vec<ExonHit>) -> Result<()> {
        let Some(entry) = self.genes.iter_mut().find(|g| g.label == label) else {
            self.genes.push(GeneEntry {
                label: label.to_string(),
                origin,
                exons,
            });
            return Ok(());
        };

        if origin != GeneOrigin::Region || entry.origin != GeneOrigin::Region {
            // Plain gene names attach once
            return Err(AnnotateError::DuplicateAnnotation {
                interval: String::new(),
                gene: label.to_string(),
            });
        }

        for hit in exons {
            if !entry.exons.iter().any(|e| e.number == hit.number) {
                entry.exons.push(hit);
            }
        }
        Ok(())
    }

    /// True if `label` is already attached.
    #[inline]
    pub fn contains(&self, label: &str) -> bool {
        self.genes.iter().any(|g| g.label == label)
    }

    /// True if `label` already records exon `number`.
    pub fn has_exon_number(&self, label: &str, number: u32) -> bool {
        self.entry(label)
            .is_some_and(|g| g.exons.iter().any(|e| e.number == number))
    }

    /// Gene labels in insertion order.
    pub fn gene_names(&self) -> impl Iterator<Item = &str> {
        self.genes.iter().map(|g| g.label.as_str())
    }

    /// Exon ranges recorded for `label`.
    pub fn exons(&self, label: &str) -> Option<Vec<&GenomicRange>> {
        self.entry(label)
            .map(|g| g.exons.iter().map(|e| &e.range).collect())
    }

    /// Exon numbers recorded for `label`, aligned with [`exons`](Self::exons).
    pub fn exon_numbers(&self, label: &str) -> Option<Vec<u32>> {
        self.entry(label)
            .map(|g| g.exons.iter().map(|e| e.number).collect())
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Render as `Unknown` or tab-separated `gene[exon_N,...]` tokens.
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn entry(&self, label: &str) -> Option<&GeneEntry> {
        self.genes.iter().find(|g| g.label == label)
    }
}

impl fmt::Display for AnnotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.genes.is_empty() {
            return f.write_str(UNKNOWN);
        }

        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{}[", gene.label)?;
            if gene.exons.is_empty() {
                f.write_str(INTRON_UTR)?;
            } else {
                for (j, exon) in gene.exons.iter().enumerate() {
                    if j > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "exon_{}", exon.number)?;
                }
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
