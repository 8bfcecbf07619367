use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use regex::Regex;
use simple_logger::SimpleLogger;

use genome_browser::{Diagram, Gene, IntervalTrack, RefGene, TrackOptions};

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None)]
struct Args {
    /// refGene table, optionally compressed
    refgene: PathBuf,

    /// Gene symbol or accession to draw; may be repeated
    #[arg(short, long = "gene", value_name = "NAME", required_unless_present = "pattern")]
    genes: Vec<String>,

    /// Regex matched against gene symbols and accessions
    #[arg(short, long, value_name = "REGEX")]
    pattern: Option<String>,

    /// Distance between axis ticks
    #[arg(short, long, default_value_t = 500)]
    step: u64,

    /// Pull-back multiplier of strand arrows
    #[arg(long, default_value_t = 1.0)]
    pullback: f64,

    /// Text shown in the bottom-right corner
    #[arg(short, long)]
    annotation: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("ERROR: failed to initialise logger: {err}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let pattern = args.pattern.as_deref().map(Regex::new).transpose()?;
    let wanted: HashSet<&str> = args.genes.iter().map(String::as_str).collect();

    let selected = |gene: &Gene| {
        wanted.contains(gene.id())
            || gene.name().is_some_and(|name| wanted.contains(name))
            || pattern.as_ref().is_some_and(|re| {
                re.is_match(gene.id()) || gene.name().is_some_and(|name| re.is_match(name))
            })
    };

    let refgene = RefGene::new(&args.refgene);
    let mut genes = Vec::new();
    for record in refgene.genes()? {
        let gene = record?;
        if selected(&gene) {
            info!("selected {} ({})", gene.id(), gene.name().unwrap_or("-"));
            genes.push(gene);
        }
    }

    // one shared axis only makes sense on a single chromosome
    let chroms: BTreeSet<&str> = genes.iter().map(Gene::chrom).collect();
    if chroms.len() > 1 {
        let listed: Vec<&str> = chroms.into_iter().collect();
        return Err(format!(
            "selected genes lie on several chromosomes ({}); narrow the selection",
            listed.join(", ")
        )
        .into());
    }

    let options = |name: &str| TrackOptions::new(name).step(args.step).pullback(args.pullback);
    let mut transcripts = IntervalTrack::with_options(options("Transcripts"));
    let mut exons = IntervalTrack::with_options(options("Exons").height_ratio(0.5));

    for gene in &genes {
        for exon in gene.exons() {
            let label = format!("{} exon {}", gene.id(), exon.rank());
            exons.add_interval(exon.interval().clone().with_name(label));
        }
        transcripts.add_interval(gene.to_interval());
    }

    let file = args
        .refgene
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = match genes.first() {
        Some(gene) => format!("{file} {}", gene.chrom()),
        None => file,
    };
    let mut diagram = Diagram::new().with_name(title);
    diagram.add_track(transcripts, false);
    diagram.add_track(exons, false);
    if let Some(annotation) = &args.annotation {
        diagram.set_annotation(annotation);
    }

    let manifest = diagram.compose()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &manifest)?;
    writeln!(out)?;

    Ok(())
}
