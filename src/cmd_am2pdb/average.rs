use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("average")
        .about("Averages AlphaMissense scores per reference position")
        .after_help(
            r###"
This command groups the substitutions of a variant table by position and writes
the arithmetic mean of each group, rounded to 3 decimals, as `position<TAB>score`.

Notes:
* Rows with an unreadable variant code or a score outside [0, 1] are dropped with a warning
* Positions without any substitution are not listed
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'

Examples:
1. Per-position means:
   am2pdb average P04637.csv

2. From the genome-wide table, filtered beforehand:
   zcat AlphaMissense_aa_substitutions.tsv.gz | grep -e protein_variant -e P04637 | am2pdb average stdin

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
    let scores = super::load_scores(args.get_one::<String>("variants").unwrap())?;

    let mut writer = am2pdb::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("position\tscore\n"))?;
    for (position, score) in scores.iter() {
        writer.write_fmt(format_args!("{}\t{:.3}\n", position, score))?;
    }
    writer.flush()?;

    Ok(())
}
