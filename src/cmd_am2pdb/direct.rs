use am2pdb::libs::pipeline::{annotate_structure_by_number, apply_annotations};
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("direct")
        .about("Writes scores into a model numbered like the reference")
        .after_help(
            r###"
This command skips the alignment: the residue sequence number is taken as the
reference position. It suits predicted models such as AlphaFold DB entries,
whose residues are numbered 1..N along the UniProt sequence.

Notes:
* Only standard residues (ATOM, one of the 20 amino acids, with a CA atom) are scored
* Residues with an insertion code or a number below 1 get the sentinel
* Residue names are not checked against the variant codes

Examples:
1. AlphaFold model:
   am2pdb direct AF-P04637-F1-model_v4.pdb P04637.csv -o AF-P04637.am.pdb

"###,
        )
        .arg(
            Arg::new("pdb")
                .required(true)
                .index(1)
                .help("Input PDB file"),
        )
        .arg(
            Arg::new("variants")
                .required(true)
                .index(2)
                .help("AlphaMissense variant table"),
        )
        .arg(super::arg_chain())
        .arg(super::arg_sentinel())
        .arg(super::arg_parallel())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let sentinel = *args.get_one::<f64>("sentinel").unwrap();
    let chains = super::chains(args);
    super::set_threads(args)?;

    let scores = super::load_scores(args.get_one::<String>("variants").unwrap())?;
    let mut structure = super::load_structure(args.get_one::<String>("pdb").unwrap())?;

    let results = annotate_structure_by_number(&structure, &scores, chains.as_deref(), sentinel);
    apply_annotations(&mut structure, &results, sentinel)?;

    let mut writer = am2pdb::writer(args.get_one::<String>("outfile").unwrap())?;
    structure.write_to(&mut writer)?;
    writer.flush()?;

    Ok(())
}
