//! Error type shared by the readers, the engine and the CLI.

use std::io;
use thiserror::Error;

/// Errors that can occur while annotating a design.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Contig '{contig}' not found in sequence dictionary")]
    UnknownContig { contig: String },

    #[error("Invalid range {contig}:{start}-{end} (start > end)")]
    InvalidRange { contig: String, start: u64, end: u64 },

    /// A transcript gene was attached twice to the same interval.
    #[error("Gene '{gene}' attached twice to interval {interval}")]
    DuplicateAnnotation { interval: String, gene: String },

    /// Region label without the `<gene>_f<N>` / `<gene>_r<N>` structure.
    #[error("Malformed region label '{label}': {reason}")]
    MalformedRegionLabel { label: String, reason: String },

    #[error("{stream} stream not sorted: {message}")]
    UnsortedInput { stream: String, message: String },

    #[error("Cursor moved backwards: {from} -> {to}")]
    CursorRegression { from: String, to: String },
}

impl AnnotateError {
    /// True for errors that only affect one record's contribution.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnnotateError::MalformedRegionLabel { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
