//! targetnote: annotate capture intervals with overlapping genes and exons
//!
//! Usage: targetnote -L <INTERVALS> -r <REFGENE> [OPTIONS]

use clap::Parser;
use log::{error, info, Level};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use targetnote::commands::AnnotateCommand;
use targetnote::config::{AnnotateConfig, DEFAULT_REGION_PREFIX};
use targetnote::error::Result;
use targetnote::genome::Genome;

#[derive(Parser)]
#[command(name = "targetnote")]
#[command(version)]
#[command(about = "Annotate sorted capture intervals with the genes and exons they overlap", long_about = None)]
struct Cli {
    /// Intervals to annotate (interval_list, or BED when the name ends in .bed)
    #[arg(short = 'L', long)]
    intervals: PathBuf,

    /// Gene models in UCSC refGene/genePred format, sorted like the intervals
    #[arg(short = 'r', long)]
    refgene: PathBuf,

    /// Labelled target regions (BED, name column like GENE_f12)
    #[arg(short = 'b', long)]
    regions: Option<PathBuf>,

    /// Genome file for contig ordering (default: @SQ header of the intervals)
    #[arg(short = 'g', long)]
    genome: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Prefix prepended to gene keys taken from region labels
    #[arg(long, default_value = DEFAULT_REGION_PREFIX)]
    region_prefix: String,

    /// Print annotation statistics when done
    #[arg(long)]
    stats: bool,

    /// Log per-record diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::Debug } else { Level::Info };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let start = Instant::now();
    if let Err(e) = run_annotate(cli) {
        error!("{}", e);
        process::exit(1);
    }
    info!("Elapsed time: {:?}", start.elapsed());
}

fn run_annotate(cli: Cli) -> Result<()> {
    let genome = Genome::resolve(cli.genome.as_deref(), &cli.intervals)?;
    info!("Sequence dictionary: {} contigs", genome.len());

    let config = AnnotateConfig::new().with_region_prefix(cli.region_prefix);
    let cmd = AnnotateCommand::with_config(config);

    let stats = match cli.output {
        Some(path) => {
            let mut file = File::create(&path)?;
            cmd.run(
                &genome,
                &cli.intervals,
                &cli.refgene,
                cli.regions.as_ref(),
                &mut file,
            )?
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            cmd.run(
                &genome,
                &cli.intervals,
                &cli.refgene,
                cli.regions.as_ref(),
                &mut handle,
            )?
        }
    };

    if stats.engine.malformed_regions > 0 {
        info!(
            "{} regions had labels that could not be parsed",
            stats.engine.malformed_regions
        );
    }
    if cli.stats {
        info!("Annotation stats: {}", stats);
    }
    Ok(())
}
