//! Command implementations for targetnote.

pub mod annotate;

pub use annotate::{AnnotateCommand, AnnotateStats};
