use am2pdb::libs::aggregate::substitution_matrix;
use am2pdb::libs::sequence::STANDARD_AA;
use clap::*;
use itertools::Itertools;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("matrix")
        .about("Tabulates the score of every substitution")
        .after_help(
            r###"
This command pivots the variant table into one row per reference position and
one column per alternative amino acid, in the order ACDEFGHIKLMNPQRSTVWY.

Output columns: position, ref, then the 20 amino acids. Substitutions without a
score, including the reference residue itself, are written as NA.

Notes:
* Repeated substitutions are averaged
* Alternatives outside the 20 standard amino acids are left out
* Reads from stdin if the input file is 'stdin'

Examples:
1. Heatmap data for a protein:
   am2pdb matrix P04637.csv -o P04637.matrix.tsv

"###,
        )
        .arg(
            Arg::new("variants")
                .required(true)
                .index(1)
                .help("AlphaMissense variant table"),
        )
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let variants = super::load_variants(args.get_one::<String>("variants").unwrap())?;
    let matrix = substitution_matrix(&variants);

    let mut writer = am2pdb::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!(
        "position\tref\t{}\n",
        STANDARD_AA.iter().map(|&c| c as char).join("\t")
    ))?;
    for (position, row) in matrix.iter() {
        let cells = row
            .scores
            .iter()
            .map(|v| match v {
                Some(v) => format!("{:.3}", v),
                None => "NA".to_string(),
            })
            .join("\t");
        writer.write_fmt(format_args!("{}\t{}\t{}\n", position, row.ref_aa, cells))?;
    }
    writer.flush()?;

    Ok(())
}
