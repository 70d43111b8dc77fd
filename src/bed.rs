//! Streaming readers for interval lists and BED regions.
//!
//! Every record is converted to 1-based inclusive coordinates on the
//! contig ranks of a shared [`Genome`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::debug;

use crate::error::{AnnotateError, Result};
use crate::genome::Genome;
use crate::interval::{GenomicRange, Region};
use crate::streaming::buffers::DEFAULT_INPUT_BUFFER;
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, split_fields};

/// Coordinate convention of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// BED: 0-based start, exclusive end.
    ZeroBasedHalfOpen,
    /// Picard interval_list: 1-based start, inclusive end.
    OneBasedInclusive,
}

impl CoordinateSystem {
    /// `.bed` files are BED; everything else is read as an interval_list.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_bed = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bed"));
        if is_bed {
            CoordinateSystem::ZeroBasedHalfOpen
        } else {
            CoordinateSystem::OneBasedInclusive
        }
    }

    /// Column holding the record name.
    fn name_column(self) -> usize {
        match self {
            CoordinateSystem::ZeroBasedHalfOpen => 3,
            CoordinateSystem::OneBasedInclusive => 4,
        }
    }
}

/// Line source shared by the record readers: skips headers and comments
/// and tracks the line number for error messages.
pub struct LineReader<R: Read> {
    reader: BufReader<R>,
    source: String,
    line_number: usize,
    buffer: String,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_INPUT_BUFFER, reader),
            source: source.into(),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Move to the next line carrying a record. Returns false at end of input.
    pub fn next_line(&mut self) -> Result<bool> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(false);
            }
            self.line_number += 1;

            if !should_skip_line(self.line().as_bytes()) {
                return Ok(true);
            }
        }
    }

    /// The current line, without its line terminator.
    #[inline]
    pub fn line(&self) -> &str {
        self.buffer.trim_end_matches(['\n', '\r'])
    }

    /// Build a parse error at the current line.
    pub fn error(&self, message: impl Into<String>) -> AnnotateError {
        AnnotateError::Parse {
            file: self.source.clone(),
            line: self.line_number,
            message: message.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

/// A located record with its optional name column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    pub range: GenomicRange,
    pub name: Option<String>,
}

impl BedRecord {
    /// Turn into a region; the name column becomes the label.
    pub fn into_region(self) -> Region {
        Region::new(self.range, self.name.unwrap_or_default())
    }
}

/// Streaming reader for BED and interval_list records.
pub struct RecordReader<'g, R: Read> {
    lines: LineReader<R>,
    genome: &'g Genome,
    coordinates: CoordinateSystem,
    skip_unknown_contigs: bool,
    skipped: usize,
}

impl<'g> RecordReader<'g, File> {
    /// Open a file, picking the coordinate convention from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P, genome: &'g Genome) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(
            file,
            path.display().to_string(),
            genome,
            CoordinateSystem::from_path(path),
        ))
    }
}

impl<'g, R: Read> RecordReader<'g, R> {
    pub fn new(
        reader: R,
        source: impl Into<String>,
        genome: &'g Genome,
        coordinates: CoordinateSystem,
    ) -> Self {
        Self {
            lines: LineReader::new(reader, source),
            genome,
            coordinates,
            skip_unknown_contigs: false,
            skipped: 0,
        }
    }

    /// Skip records on contigs missing from the dictionary instead of failing.
    pub fn skip_unknown_contigs(mut self, skip: bool) -> Self {
        self.skip_unknown_contigs = skip;
        self
    }

    /// Read the next record.
    pub fn read_record(&mut self) -> Result<Option<BedRecord>> {
        loop {
            if !self.lines.next_line()? {
                return Ok(None);
            }
            let fields = split_fields(self.lines.line());
            if fields.len() < 3 {
                return Err(self
                    .lines
                    .error(format!("Expected at least 3 fields, got {}", fields.len())));
            }

            let contig = fields[0];
            let Some(rank) = self.genome.rank(contig) else {
                if self.skip_unknown_contigs {
                    debug!(
                        "{}:{}: skipping record on contig '{}' absent from dictionary",
                        self.lines.source(),
                        self.lines.line_number(),
                        contig
                    );
                    self.skipped += 1;
                    continue;
                }
                return Err(AnnotateError::UnknownContig {
                    contig: contig.to_string(),
                });
            };

            let start = parse_u64_fast(fields[1].as_bytes()).ok_or_else(|| {
                self.lines.error(format!("Invalid start position: '{}'", fields[1]))
            })?;
            let end = parse_u64_fast(fields[2].as_bytes()).ok_or_else(|| {
                self.lines.error(format!("Invalid end position: '{}'", fields[2]))
            })?;

            let start = match self.coordinates {
                CoordinateSystem::ZeroBasedHalfOpen => start + 1,
                CoordinateSystem::OneBasedInclusive => start,
            };
            if start == 0 || start > end {
                return Err(self
                    .lines
                    .error(format!("Invalid interval {}:{}-{}", contig, fields[1], fields[2])));
            }

            let name = fields
                .get(self.coordinates.name_column())
                .filter(|n| !n.is_empty())
                .map(|n| n.to_string());

            return Ok(Some(BedRecord {
                range: GenomicRange {
                    contig: contig.to_string(),
                    rank,
                    start,
                    end,
                },
                name,
            }));
        }
    }

    /// Records skipped because their contig was unknown.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn source(&self) -> &str {
        self.lines.source()
    }
}

impl<R: Read> Iterator for RecordReader<'_, R> {
    type Item = Result<BedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Parse records from a string (useful for testing).
pub fn parse_records(
    content: &str,
    genome: &Genome,
    coordinates: CoordinateSystem,
) -> Result<Vec<BedRecord>> {
    RecordReader::new(content.as_bytes(), "<memory>", genome, coordinates).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome() -> Genome {
        Genome::from_names(["chr1", "chr2"])
    }

    #[test]
    fn test_bed_converts_to_one_based() {
        let records = parse_records(
            "chr1\t99\t200\tTCGA6K_f12\n",
            &genome(),
            CoordinateSystem::ZeroBasedHalfOpen,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].range.start, 100);
        assert_eq!(records[0].range.end, 200);
        assert_eq!(records[0].name.as_deref(), Some("TCGA6K_f12"));
    }

    #[test]
    fn test_interval_list_keeps_coordinates() {
        let content = "@HD\tVN:1.0\n@SQ\tSN:chr1\tLN:1000\nchr1\t100\t200\t+\ttarget_1\nchr2\t5\t5\t-\t.\n";
        let records =
            parse_records(content, &genome(), CoordinateSystem::OneBasedInclusive).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].range.start, 100);
        assert_eq!(records[0].name.as_deref(), Some("target_1"));
        assert_eq!(records[1].range.rank, 1);
        assert_eq!(records[1].range.len(), 1);
    }

    #[test]
    fn test_skip_comments_and_track_lines() {
        let content = "# comment\ntrack name=test\nbrowser position chr1:1-1000\nchr1\t100\t200\n\r\n";
        let records =
            parse_records(content, &genome(), CoordinateSystem::ZeroBasedHalfOpen).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, None);
    }

    #[test]
    fn test_invalid_records() {
        let g = genome();
        let bed = CoordinateSystem::ZeroBasedHalfOpen;
        assert!(parse_records("chr1\t100\n", &g, bed).is_err());
        assert!(parse_records("chr1\tabc\t200\n", &g, bed).is_err());
        assert!(parse_records("chr1\t300\t200\n", &g, bed).is_err());
        assert!(parse_records("chr1\t0\t10\n", &g, CoordinateSystem::OneBasedInclusive).is_err());

        let err = parse_records("chr1\tx\t200\n", &g, bed).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_unknown_contig() {
        let g = genome();
        let content = "chrUn\t1\t10\tA_f1\nchr2\t1\t10\tB_f1\n";

        let err = parse_records(content, &g, CoordinateSystem::ZeroBasedHalfOpen).unwrap_err();
        assert!(matches!(err, AnnotateError::UnknownContig { .. }));

        let mut reader = RecordReader::new(
            content.as_bytes(),
            "regions.bed",
            &g,
            CoordinateSystem::ZeroBasedHalfOpen,
        )
        .skip_unknown_contigs(true);
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.range.contig, "chr2");
        assert_eq!(reader.skipped(), 1);
        assert_eq!(record.into_region().label, "B_f1");
    }

    #[test]
    fn test_coordinate_system_from_path() {
        assert_eq!(
            CoordinateSystem::from_path("targets.bed"),
            CoordinateSystem::ZeroBasedHalfOpen
        );
        assert_eq!(
            CoordinateSystem::from_path("targets.interval_list"),
            CoordinateSystem::OneBasedInclusive
        );
    }
}
