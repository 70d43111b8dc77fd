//! Streaming building blocks for the annotation pass.
//!
//! This module provides the shared pieces the engine and the traversal
//! driver are built from:
//! - Zero-allocation field parsing and region-label splitting
//! - Per-stream sort validation
//! - The live interval and transcript buffers
//! - Buffered output formatting
//!
//! The pass keeps O(k) memory where k = the records spanning any one position.

pub mod buffers;
pub mod output;
pub mod parsing;
pub mod validation;

pub use buffers::LiveBuffers;
pub use output::{AnnotationSink, AnnotationWriter};
pub use parsing::{parse_region_label, parse_u64_fast, should_skip_line, split_fields};
pub use validation::StreamOrderValidator;
