//! Output sink for finalized intervals.
//!
//! Uses itoa for coordinate formatting to avoid allocation per line.

use std::io::{BufWriter, Write};

use crate::annotation::AnnotationState;
use crate::error::{AnnotateError, Result};
use crate::interval::GenomicRange;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;

/// Receives each interval exactly once, when the engine finalizes it.
pub trait AnnotationSink {
    fn emit(&mut self, range: &GenomicRange, state: &AnnotationState) -> Result<()>;
}

/// Collects finalized intervals in memory.
impl AnnotationSink for Vec<(GenomicRange, AnnotationState)> {
    fn emit(&mut self, range: &GenomicRange, state: &AnnotationState) -> Result<()> {
        self.push((range.clone(), state.clone()));
        Ok(())
    }
}

/// Writes `contig\tstart\tend\tannotation` lines.
pub struct AnnotationWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    lines_written: usize,
}

impl<W: Write> AnnotationWriter<W> {
    /// Create a new writer with the default 2MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new writer with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            lines_written: 0,
        }
    }

    /// Write one annotated interval followed by newline.
    pub fn write_annotation(
        &mut self,
        range: &GenomicRange,
        state: &AnnotationState,
    ) -> Result<()> {
        self.writer.write_all(range.contig.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(range.start).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(range.end).as_bytes())?;
        self.writer.write_all(b"\t")?;
        write!(self.writer, "{}", state)?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(AnnotateError::Io)
    }
}

impl<W: Write> AnnotationSink for AnnotationWriter<W> {
    fn emit(&mut self, range: &GenomicRange, state: &AnnotationState) -> Result<()> {
        self.write_annotation(range, state)
    }
}
