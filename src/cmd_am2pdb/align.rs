use am2pdb::libs::pipeline::{annotate_structure, AnnotateConfig};
use am2pdb::libs::aggregate::AggregatedScore;
use am2pdb::libs::report::write_report;
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("align")
        .about("Aligns structure chains to the reference and reports the blocks")
        .after_help(
            r###"
This command runs only the alignment step of `annotate` and writes the evidence
report: score, covered ranges, matched blocks and the aligned sequences.

Block coordinates are 0-based half-open `reference:structure` ranges, e.g.
`0..15:0..15 16..40:15..39`.

Examples:
1. Report for all chains:
   am2pdb align 1abc.pdb P04637.fasta

2. Chain B with cheaper gaps:
   am2pdb align 1abc.pdb P04637.fasta -c B --gap-open -2

"###,
        )
        .arg(
            Arg::new("pdb")
                .required(true)
                .index(1)
                .help("Input PDB file"),
        )
        .arg(
            Arg::new("reference")
                .required(true)
                .index(2)
                .help("Reference protein in FASTA format, first record is used"),
        )
        .arg(super::arg_chain())
        .args(super::args_align())
        .arg(super::arg_parallel())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let config = AnnotateConfig {
        align: super::align_params(args),
        chains: super::chains(args),
        ..Default::default()
    };
    super::set_threads(args)?;

    let reference = super::load_reference(args.get_one::<String>("reference").unwrap())?;
    let structure = super::load_structure(args.get_one::<String>("pdb").unwrap())?;

    let results = annotate_structure(&structure, &reference, &AggregatedScore::default(), &config)?;

    let mut writer = am2pdb::writer(args.get_one::<String>("outfile").unwrap())?;
    write_report(&mut writer, &reference, &results)?;
    writer.flush()?;

    Ok(())
}
