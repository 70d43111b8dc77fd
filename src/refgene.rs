//! Streaming reader for UCSC refGene / genePred gene tables.
//!
//! Accepted layouts (tab-separated, 0-based half-open coordinates):
//!
//! | Columns | Layout |
//! |---------|--------|
//! | 16 | refGene: `bin name chrom strand txStart txEnd cdsStart cdsEnd exonCount exonStarts exonEnds score name2 ...` |
//! | 15 | extended genePred: as refGene without `bin` |
//! | 10 | plain genePred: no `name2`, the transcript name is used as gene name |

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::bed::LineReader;
use crate::error::Result;
use crate::genome::Genome;
use crate::interval::{GenomicRange, Transcript};
use crate::streaming::parsing::{parse_u64_fast, split_fields};

/// Streaming gene-table reader yielding one [`Transcript`] per line.
pub struct RefGeneReader<'g, R: Read> {
    lines: LineReader<R>,
    genome: &'g Genome,
    skipped: usize,
}

impl<'g> RefGeneReader<'g, File> {
    pub fn from_path<P: AsRef<Path>>(path: P, genome: &'g Genome) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(file, path.display().to_string(), genome))
    }
}

impl<'g, R: Read> RefGeneReader<'g, R> {
    pub fn new(reader: R, source: impl Into<String>, genome: &'g Genome) -> Self {
        Self {
            lines: LineReader::new(reader, source),
            genome,
            skipped: 0,
        }
    }

    /// Read the next transcript. Transcripts on contigs absent from the
    /// dictionary (alt haplotypes, unplaced scaffolds) are skipped.
    pub fn read_transcript(&mut self) -> Result<Option<Transcript>> {
        loop {
            if !self.lines.next_line()? {
                return Ok(None);
            }
            let fields = split_fields(self.lines.line());

            // A leading integer column in a 16-column row is the UCSC bin
            let has_bin = fields.len() >= 16 && parse_u64_fast(fields[0].as_bytes()).is_some();
            let offset = usize::from(has_bin);
            let fields = &fields[offset..];
            if fields.len() < 10 {
                return Err(self.lines.error(format!(
                    "Expected at least 10 genePred fields, got {}",
                    fields.len()
                )));
            }

            let contig = fields[1];
            let Some(rank) = self.genome.rank(contig) else {
                debug!(
                    "{}:{}: skipping transcript {} on contig '{}' absent from dictionary",
                    self.lines.source(),
                    self.lines.line_number(),
                    fields[0],
                    contig
                );
                self.skipped += 1;
                continue;
            };

            let tx_start = self.u64_field(fields[3], "txStart")?;
            let tx_end = self.u64_field(fields[4], "txEnd")?;
            let range = self.locate(contig, rank, tx_start, tx_end)?;

            let exon_count = self.u64_field(fields[7], "exonCount")? as usize;
            let starts = self.position_list(fields[8], "exonStarts")?;
            let ends = self.position_list(fields[9], "exonEnds")?;
            if starts.len() != exon_count || ends.len() != exon_count {
                return Err(self.lines.error(format!(
                    "exonCount is {} but found {} starts and {} ends",
                    exon_count,
                    starts.len(),
                    ends.len()
                )));
            }

            let exons = starts
                .into_iter()
                .zip(ends)
                .map(|(s, e)| self.locate(contig, rank, s, e))
                .collect::<Result<Vec<_>>>()?;

            let name = fields[0];
            let gene_name = fields
                .get(11)
                .copied()
                .filter(|g| !g.is_empty())
                .unwrap_or(name);

            return Ok(Some(Transcript::new(gene_name, name, range, exons)));
        }
    }

    /// Transcripts skipped because their contig was unknown.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn source(&self) -> &str {
        self.lines.source()
    }

    fn u64_field(&self, field: &str, what: &str) -> Result<u64> {
        parse_u64_fast(field.as_bytes())
            .ok_or_else(|| self.lines.error(format!("Invalid {}: '{}'", what, field)))
    }

    fn position_list(&self, field: &str, what: &str) -> Result<Vec<u64>> {
        field
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| self.u64_field(s, what))
            .collect()
    }

    /// Convert a 0-based half-open span to a 1-based inclusive range.
    fn locate(&self, contig: &str, rank: u32, start: u64, end: u64) -> Result<GenomicRange> {
        GenomicRange::new(contig, rank, start + 1, end).map_err(|_| {
            self.lines
                .error(format!("Empty or inverted span {}:{}-{}", contig, start, end))
        })
    }
}

impl<R: Read> Iterator for RefGeneReader<'_, R> {
    type Item = Result<Transcript>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_transcript().transpose()
    }
}

/// Parse transcripts from a string (useful for testing).
pub fn parse_transcripts(content: &str, genome: &Genome) -> Result<Vec<Transcript>> {
    RefGeneReader::new(content.as_bytes(), "<memory>", genome).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotateError;

    const REFGENE_ROW: &str = "585\tNM_000001\tchr1\t+\t99\t400\t120\t380\t3\t99,199,349,\t150,250,400,\t0\tGENEA\tcmpl\tcmpl\t0,0,0,";

    fn genome() -> Genome {
        Genome::from_names(["chr1", "chr2"])
    }

    #[test]
    fn test_parse_refgene_row() {
        let transcripts = parse_transcripts(REFGENE_ROW, &genome()).unwrap();

        assert_eq!(transcripts.len(), 1);
        let tx = &transcripts[0];
        assert_eq!(tx.gene_name, "GENEA");
        assert_eq!(tx.name, "NM_000001");
        assert_eq!((tx.range.start, tx.range.end), (100, 400));
        assert_eq!(tx.exons.len(), 3);
        assert_eq!((tx.exons[1].start, tx.exons[1].end), (200, 250));
    }

    #[test]
    fn test_parse_plain_genepred() {
        let row = "NM_2\tchr2\t-\t0\t100\t0\t100\t1\t0,\t100,";
        let transcripts = parse_transcripts(row, &genome()).unwrap();

        assert_eq!(transcripts[0].gene_name, "NM_2");
        assert_eq!(transcripts[0].range.rank, 1);
        assert_eq!(transcripts[0].exons[0].start, 1);
    }

    #[test]
    fn test_unknown_contig_is_skipped() {
        let content = format!(
            "1\tNM_9\tchr6_hap\t+\t0\t10\t0\t10\t1\t0,\t10,\t0\tHAP\tcmpl\tcmpl\t0,\n{}",
            REFGENE_ROW
        );
        let g = genome();
        let mut reader = RefGeneReader::new(content.as_bytes(), "refGene.txt", &g);

        let tx = reader.read_transcript().unwrap().unwrap();
        assert_eq!(tx.gene_name, "GENEA");
        assert_eq!(reader.skipped(), 1);
        assert!(reader.read_transcript().unwrap().is_none());
    }

    #[test]
    fn test_exon_count_mismatch() {
        let row = "NM_2\tchr2\t-\t0\t100\t0\t100\t2\t0,\t100,";
        let err = parse_transcripts(row, &genome()).unwrap_err();
        assert!(err.to_string().contains("exonCount"));
    }

    #[test]
    fn test_too_few_columns() {
        let err = parse_transcripts("NM_2\tchr2\t-\t0\t100", &genome()).unwrap_err();
        assert!(matches!(err, AnnotateError::Parse { line: 1, .. }));
    }
}
