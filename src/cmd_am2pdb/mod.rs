//! Subcommand modules for the `am2pdb` binary.

pub mod align;
pub mod annotate;
pub mod average;
pub mod compare;
pub mod direct;
pub mod matrix;

use am2pdb::libs::aggregate::{aggregate, AggregatedScore};
use am2pdb::libs::align::AlignParams;
use am2pdb::libs::sequence::ReferenceSequence;
use am2pdb::libs::structure::{fits_slot, Structure};
use am2pdb::libs::variant::{read_variants, VariantScore};
use anyhow::Context;
use clap::*;
use tracing::{info, warn};

pub fn arg_chain() -> Arg {
    Arg::new("chain")
        .long("chain")
        .short('c')
        .num_args(1)
        .value_delimiter(',')
        .help("Chains to annotate, comma separated. Default: all chains of the first model")
}

pub fn arg_sentinel() -> Arg {
    Arg::new("sentinel")
        .long("sentinel")
        .num_args(1)
        .default_value("-1")
        .allow_negative_numbers(true)
        .value_parser(parse_sentinel)
        .help("Value written for residues without a score, -99.99 to 999.99")
}

fn parse_sentinel(s: &str) -> Result<f64, String> {
    let value = s.parse::<f64>().map_err(|e| format!("{}: {}", s, e))?;
    if fits_slot(value) {
        Ok(value)
    } else {
        Err(format!(
            "{} does not fit the 6-column B-factor field with 2 decimals",
            s
        ))
    }
}

pub fn arg_outfile() -> Arg {
    Arg::new("outfile")
        .long("outfile")
        .short('o')
        .num_args(1)
        .default_value("stdout")
        .help("Output filename. [stdout] for screen")
}

pub fn args_align() -> Vec<Arg> {
    let score = |name: &'static str, long: &'static str, default: &'static str, help: &'static str| {
        Arg::new(name)
            .long(long)
            .num_args(1)
            .default_value(default)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i32))
            .help(help)
    };

    vec![
        score("match", "match", "1", "Score of an identical pair"),
        score("mismatch", "mismatch", "-100", "Score of a non-identical pair"),
        score("gap_open", "gap-open", "-10", "Score of the first position of a gap"),
        score("gap_extend", "gap-extend", "-1", "Score of each further gap position"),
    ]
}

pub fn align_params(args: &ArgMatches) -> AlignParams {
    AlignParams {
        match_score: *args.get_one::<i32>("match").unwrap(),
        mismatch_score: *args.get_one::<i32>("mismatch").unwrap(),
        gap_open: *args.get_one::<i32>("gap_open").unwrap(),
        gap_extend: *args.get_one::<i32>("gap_extend").unwrap(),
    }
}

pub fn chains(args: &ArgMatches) -> Option<Vec<String>> {
    args.get_many::<String>("chain")
        .map(|ids| ids.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

/// Reads the usable rows of the variant table. An empty table is a warning, not an error.
pub fn load_variants(infile: &str) -> anyhow::Result<Vec<VariantScore>> {
    let reader = am2pdb::reader(infile)?;
    let table = read_variants(reader).with_context(|| format!("reading variants from {}", infile))?;
    if table.is_empty() {
        warn!("No usable variant rows in {}", infile);
    }
    info!(
        "{} variants, {} dropped",
        table.variants.len(),
        table.dropped.len()
    );
    Ok(table.variants)
}

/// Reads and averages the variant table.
pub fn load_scores(infile: &str) -> anyhow::Result<AggregatedScore> {
    let variants = load_variants(infile)?;
    let scores = aggregate(&variants);
    info!("{} positions scored", scores.len());
    Ok(scores)
}

pub fn load_reference(infile: &str) -> anyhow::Result<ReferenceSequence> {
    let reader = am2pdb::reader(infile)?;
    let reference = ReferenceSequence::from_fasta(reader)
        .with_context(|| format!("reading reference from {}", infile))?;
    info!("Reference {}: {} residues", reference.name(), reference.len());
    Ok(reference)
}

pub fn load_structure(infile: &str) -> anyhow::Result<Structure> {
    let reader = am2pdb::reader(infile)?;
    let structure =
        Structure::from_reader(reader).with_context(|| format!("reading structure from {}", infile))?;
    if structure.chain_ids().is_empty() {
        warn!("No atom records in {}", infile);
    }
    if !structure.malformed.is_empty() {
        warn!(
            "{} atom records in {} could not be read and are kept unchanged",
            structure.malformed.len(),
            infile
        );
    }
    Ok(structure)
}

pub fn set_threads(args: &ArgMatches) -> anyhow::Result<()> {
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;
    Ok(())
}

pub fn arg_parallel() -> Arg {
    Arg::new("parallel")
        .long("parallel")
        .short('p')
        .num_args(1)
        .default_value("1")
        .value_parser(value_parser!(usize))
        .help("Number of threads for parallel processing")
}
