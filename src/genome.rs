//! Sequence dictionary: the fixed contig ordering every stream shares.
//!
//! Loaded either from a `.genome`/`.fai` style file (`contig\tsize`) or from
//! the `@SQ` header lines of a Picard interval_list.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{AnnotateError, Result};

/// Contig names, sizes and ranks. Preserves the order contigs were declared in.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    /// Map of contig name to rank
    ranks: FxHashMap<String, u32>,
    /// Contig order with optional lengths
    contigs: Vec<(String, Option<u64>)>,
}

impl Genome {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from contig names in order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut genome = Self::new();
        for name in names {
            genome.insert(name.into(), None);
        }
        genome
    }

    /// Load a genome file.
    /// Format: tab-delimited with contig\tsize per line (extra columns ignored)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut genome = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(AnnotateError::Parse {
                    file: path.display().to_string(),
                    line: line_num + 1,
                    message: "Genome file requires two columns: contig and size".to_string(),
                });
            }

            let size: u64 = fields[1].parse().map_err(|_| AnnotateError::Parse {
                file: path.display().to_string(),
                line: line_num + 1,
                message: format!("Invalid contig size: {}", fields[1]),
            })?;
            genome.insert(fields[0].to_string(), Some(size));
        }

        Ok(genome)
    }

    /// Load the `@SQ` lines heading a Picard interval_list.
    ///
    /// Stops reading at the first non-header line. Returns an empty
    /// dictionary when the file has no `@SQ` lines.
    pub fn from_interval_list_header<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut genome = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if !line.starts_with('@') {
                break;
            }
            if !line.starts_with("@SQ") {
                continue;
            }

            let mut name = None;
            let mut length = None;
            for field in line.split('\t').skip(1) {
                if let Some(sn) = field.strip_prefix("SN:") {
                    name = Some(sn.to_string());
                } else if let Some(ln) = field.strip_prefix("LN:") {
                    length = ln.parse().ok();
                }
            }

            let name = name.ok_or_else(|| AnnotateError::Parse {
                file: path.display().to_string(),
                line: line_num + 1,
                message: "@SQ line without SN tag".to_string(),
            })?;
            genome.insert(name, length);
        }

        Ok(genome)
    }

    /// Pick the dictionary for a pass: the genome file when given, otherwise
    /// the `@SQ` header of the interval list.
    pub fn resolve(genome_file: Option<&Path>, intervals: &Path) -> Result<Self> {
        let genome = match genome_file {
            Some(path) => Self::from_file(path)?,
            None => Self::from_interval_list_header(intervals)?,
        };
        if genome.is_empty() {
            return Err(AnnotateError::InvalidFormat(format!(
                "No sequence dictionary: {} has no @SQ header, pass a genome file",
                intervals.display()
            )));
        }
        Ok(genome)
    }

    /// Rank of a contig in dictionary order.
    #[inline]
    pub fn rank(&self, contig: &str) -> Option<u32> {
        self.ranks.get(contig).copied()
    }

    /// Get the size of a contig, if the dictionary recorded one.
    #[inline]
    pub fn contig_size(&self, contig: &str) -> Option<u64> {
        let rank = self.rank(contig)?;
        self.contigs[rank as usize].1
    }

    /// Get all contig names in order.
    pub fn contigs(&self) -> impl Iterator<Item = &str> {
        self.contigs.iter().map(|(name, _)| name.as_str())
    }

    /// Get number of contigs.
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Append a contig; a repeated name only updates its size.
    pub fn insert(&mut self, contig: String, size: Option<u64>) {
        match self.ranks.get(&contig) {
            Some(&rank) => {
                if size.is_some() {
                    self.contigs[rank as usize].1 = size;
                }
            }
            None => {
                self.ranks.insert(contig.clone(), self.contigs.len() as u32);
                self.contigs.push((contig, size));
            }
        }
    }
}
