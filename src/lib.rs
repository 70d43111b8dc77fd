// Clippy allows for the whole crate
#![allow(clippy::type_complexity)]

//! targetnote: annotate capture intervals with the genes and exons they hit.
//!
//! A single streaming pass merges three coordinate-sorted inputs (intervals,
//! gene models and optional labelled target regions) and writes one line per
//! interval listing every overlapping gene and the exons it covers.
//!
//! # Features
//!
//! - **Streaming merge-join**: memory bounded by the records live at one position
//! - **Inline sort validation**: unsorted input aborts instead of missing overlaps
//! - **BED and interval_list input**: coordinates normalized to 1-based inclusive
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use targetnote::{commands::AnnotateCommand, genome::Genome};
//!
//! let intervals = Path::new("targets.interval_list");
//! let genome = Genome::resolve(None, intervals).unwrap();
//!
//! let mut out = std::io::stdout();
//! let stats = AnnotateCommand::new()
//!     .run(&genome, intervals, Path::new("refGene.txt"), None, &mut out)
//!     .unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod annotation;
pub mod bed;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod genome;
pub mod interval;
pub mod refgene;
pub mod streaming;

// Re-export commonly used types
pub use annotation::AnnotationState;
pub use engine::{AnnotationEngine, Batch, EngineStats};
pub use error::{AnnotateError, Result};
pub use interval::{GenomicRange, Locus, Region, Transcript};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::annotation::AnnotationState;
    pub use crate::bed::{CoordinateSystem, RecordReader};
    pub use crate::commands::{AnnotateCommand, AnnotateStats};
    pub use crate::config::AnnotateConfig;
    pub use crate::engine::{AnnotationEngine, Batch};
    pub use crate::genome::Genome;
    pub use crate::interval::{GenomicRange, Locus, Region, Transcript};
    pub use crate::refgene::RefGeneReader;
    pub use crate::streaming::{AnnotationSink, AnnotationWriter};
}
