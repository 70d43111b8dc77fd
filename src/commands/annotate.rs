//! Design-file annotation: drive the engine over three sorted inputs.
//!
//! The three streams (intervals, gene models, target regions) are merged by
//! start locus. At each step the cursor moves to the smallest pending start
//! and every record starting there is handed to the engine in one batch, so
//! each record is delivered exactly once, at its first base.
//!
//! # Requirements
//!
//! - All inputs MUST be sorted by the sequence dictionary, then by start
//! - Order is validated inline; a violation aborts the pass
//! - Lines already written before an error stay valid

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;

use crate::bed::{BedRecord, RecordReader};
use crate::config::AnnotateConfig;
use crate::engine::{AnnotationEngine, Batch, EngineStats};
use crate::error::{AnnotateError, Result};
use crate::genome::Genome;
use crate::interval::{GenomicRange, Locus, Located, Region, Transcript};
use crate::refgene::RefGeneReader;
use crate::streaming::output::{AnnotationSink, AnnotationWriter};
use crate::streaming::validation::StreamOrderValidator;

/// One sorted input with a single record of lookahead.
struct OrderedStream<I, T> {
    records: I,
    pending: Option<T>,
    validator: StreamOrderValidator,
}

impl<I, T> OrderedStream<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: Located,
{
    fn new(records: I, name: &str) -> Result<Self> {
        let mut stream = Self {
            records,
            pending: None,
            validator: StreamOrderValidator::new(name),
        };
        stream.fill()?;
        Ok(stream)
    }

    fn fill(&mut self) -> Result<()> {
        self.pending = match self.records.next() {
            Some(record) => {
                let record = record?;
                self.validator.validate(record.range())?;
                Some(record)
            }
            None => None,
        };
        Ok(())
    }

    #[inline]
    fn next_locus(&self) -> Option<Locus> {
        self.pending.as_ref().map(|r| r.range().start_locus())
    }

    /// Move every record starting at `locus` into `out`.
    fn take_at(&mut self, locus: Locus, out: &mut Vec<T>) -> Result<()> {
        while self.next_locus() == Some(locus) {
            if let Some(record) = self.pending.take() {
                out.push(record);
            }
            self.fill()?;
        }
        Ok(())
    }
}

/// Annotate command configuration.
#[derive(Debug, Clone, Default)]
pub struct AnnotateCommand {
    pub config: AnnotateConfig,
}

impl AnnotateCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnnotateConfig) -> Self {
        Self { config }
    }

    /// Annotate the intervals in `intervals_path` and write one line per
    /// interval to `output`.
    ///
    /// Intervals use BED coordinates when the file ends in `.bed`, interval_list
    /// coordinates otherwise. Regions are always BED.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        genome: &Genome,
        intervals_path: P,
        transcripts_path: P,
        regions_path: Option<P>,
        output: &mut W,
    ) -> Result<AnnotateStats> {
        let mut intervals = RecordReader::from_path(intervals_path.as_ref(), genome)?;
        let mut transcripts = RefGeneReader::from_path(transcripts_path.as_ref(), genome)?;
        let mut regions = regions_path
            .map(|p| {
                RecordReader::<File>::from_path(p.as_ref(), genome)
                    .map(|r| r.skip_unknown_contigs(true))
            })
            .transpose()?;

        info!(
            "Annotating {} with {}{}",
            intervals.source(),
            transcripts.source(),
            regions
                .as_ref()
                .map(|r| format!(" and {}", r.source()))
                .unwrap_or_default()
        );

        let mut writer = AnnotationWriter::new(output);
        let result = self.run_streams(
            intervals.by_ref().map(|r| r.map(|rec| rec.range)),
            transcripts.by_ref(),
            regions
                .iter_mut()
                .flat_map(|r| r.map(|rec| rec.map(BedRecord::into_region))),
            &mut writer,
        );
        // Flush what was emitted even when the pass aborts
        let flushed = writer.flush();
        let engine = result?;
        flushed?;

        Ok(AnnotateStats {
            engine,
            skipped_transcripts: transcripts.skipped(),
            skipped_regions: regions.as_ref().map_or(0, |r| r.skipped()),
            lines_written: writer.lines_written(),
        })
    }

    /// Merge three sorted record streams and run the engine over them.
    pub fn run_streams<IV, TX, RG, S>(
        &self,
        intervals: IV,
        transcripts: TX,
        regions: RG,
        sink: &mut S,
    ) -> Result<EngineStats>
    where
        IV: Iterator<Item = Result<GenomicRange>>,
        TX: Iterator<Item = Result<Transcript>>,
        RG: Iterator<Item = Result<Region>>,
        S: AnnotationSink,
    {
        let mut intervals = OrderedStream::new(intervals, "intervals")?;
        let mut transcripts = OrderedStream::new(transcripts, "transcripts")?;
        let mut regions = OrderedStream::new(regions, "regions")?;
        let mut engine = AnnotationEngine::new(self.config.clone());

        loop {
            let next = [
                intervals.next_locus(),
                transcripts.next_locus(),
                regions.next_locus(),
            ]
            .into_iter()
            .flatten()
            .min();
            let Some(locus) = next else {
                break;
            };

            let mut batch = Batch::new();
            intervals.take_at(locus, &mut batch.intervals)?;
            transcripts.take_at(locus, &mut batch.transcripts)?;
            regions.take_at(locus, &mut batch.regions)?;

            engine.advance(locus, batch, sink)?;
        }

        engine.finish(sink)?;

        let stats = engine.stats().clone();
        if stats.intervals_emitted != stats.intervals {
            return Err(AnnotateError::InvalidFormat(format!(
                "{} intervals buffered but {} emitted",
                stats.intervals, stats.intervals_emitted
            )));
        }
        Ok(stats)
    }
}

/// Statistics from one annotation pass.
#[derive(Debug, Default, Clone)]
pub struct AnnotateStats {
    pub engine: EngineStats,
    pub skipped_transcripts: usize,
    pub skipped_regions: usize,
    pub lines_written: usize,
}

impl std::fmt::Display for AnnotateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, Lines: {}, Skipped transcripts: {}, Skipped regions: {}",
            self.engine, self.lines_written, self.skipped_transcripts, self.skipped_regions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationState;
    use tempfile::{Builder, NamedTempFile};

    fn range(start: u64, end: u64) -> GenomicRange {
        GenomicRange::new("chr1", 0, start, end).unwrap()
    }

    fn create_temp(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_run_streams_in_memory() {
        let intervals = vec![Ok(range(100, 200)), Ok(range(300, 400))];
        let transcripts = vec![Ok(Transcript::new(
            "geneA",
            "NM_1",
            range(150, 180),
            vec![range(160, 170)],
        ))];
        let regions: Vec<Result<Region>> = Vec::new();

        let mut out: Vec<(GenomicRange, AnnotationState)> = Vec::new();
        let stats = AnnotateCommand::new()
            .run_streams(
                intervals.into_iter(),
                transcripts.into_iter(),
                regions.into_iter(),
                &mut out,
            )
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].1.render(), "geneA[exon_0]");
        assert_eq!(out[1].1.render(), "Unknown");
        assert_eq!(stats.transcript_updates, 1);
    }

    #[test]
    fn test_unsorted_stream_rejected() {
        let intervals = vec![Ok(range(300, 400)), Ok(range(100, 200))];
        let mut out: Vec<(GenomicRange, AnnotationState)> = Vec::new();

        let err = AnnotateCommand::new()
            .run_streams(
                intervals.into_iter(),
                std::iter::empty(),
                std::iter::empty(),
                &mut out,
            )
            .unwrap_err();
        assert!(matches!(err, AnnotateError::UnsortedInput { .. }));
    }

    #[test]
    fn test_upstream_error_is_fatal() {
        let intervals = vec![
            Ok(range(100, 200)),
            Err(AnnotateError::InvalidFormat("bad line".to_string())),
        ];
        let mut out: Vec<(GenomicRange, AnnotationState)> = Vec::new();

        let result = AnnotateCommand::new().run_streams(
            intervals.into_iter(),
            std::iter::empty(),
            std::iter::empty(),
            &mut out,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_run_files() {
        let genome = Genome::from_names(["chr1", "chr2"]);
        let intervals = create_temp(
            "chr1\t100\t200\t+\tt1\nchr1\t1000\t1100\t+\tt2\nchr2\t50\t60\t+\tt3\n",
            ".interval_list",
        );
        let refgene = create_temp(
            "0\tNM_1\tchr1\t+\t19\t180\t19\t180\t4\t19,39,59,159,\t30,50,70,170,\t0\tgeneA\tcmpl\tcmpl\t0,0,0,0,\n",
            ".txt",
        );
        let regions = create_temp("chr1\t1049\t1080\tTCGA6K_f12\n", ".bed");

        let mut output = Vec::new();
        let stats = AnnotateCommand::new()
            .run(
                &genome,
                intervals.path(),
                refgene.path(),
                Some(regions.path()),
                &mut output,
            )
            .unwrap();

        let result = String::from_utf8(output).unwrap();
        assert_eq!(
            result,
            "chr1\t100\t200\tgeneA[exon_3]\nchr1\t1000\t1100\tTCGA_TCGA6K[exon_11]\nchr2\t50\t60\tUnknown\n"
        );
        assert_eq!(stats.lines_written, 3);
    }
}
