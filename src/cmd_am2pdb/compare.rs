use am2pdb::libs::pipeline::select_chains;
use anyhow::anyhow;
use clap::*;
use std::collections::BTreeMap;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("compare")
        .about("Tabulates mean pathogenicity against per-residue B-factor")
        .after_help(
            r###"
This command lines up the per-position mean pathogenicity with the B-factor of
the residue numbered like that position. For AlphaFold models the B-factor is
the pLDDT confidence.

Output columns: position, am, plddt. Missing values are written as NA.

Notes:
* Residue numbers are taken as reference positions, as in `am2pdb direct`
* The B-factor of a residue is read from its CA atom
* One chain is used: --chain, or the first chain of the first model

Examples:
1. AlphaFold model:
   am2pdb compare AF-P04637-F1-model_v4.pdb P04637.csv

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
        .arg(
            Arg::new("chain")
                .long("chain")
                .short('c')
                .num_args(1)
                .help("Chain to read B-factors from"),
        )
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let scores = super::load_scores(args.get_one::<String>("variants").unwrap())?;
    let structure = super::load_structure(args.get_one::<String>("pdb").unwrap())?;

    let requested: Option<Vec<String>> = args.get_one::<String>("chain").map(|c| vec![c.clone()]);
    let chain_id = select_chains(&structure, requested.as_deref())
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no chain to compare"))?;
    let chain = structure
        .chain(&chain_id)
        .ok_or_else(|| anyhow!("chain {} not found", chain_id))?;

    // position -> (am, plddt)
    let mut table: BTreeMap<usize, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (position, score) in scores.iter() {
        table.entry(position).or_default().0 = Some(score);
    }
    for residue in chain.residues.iter().filter(|r| r.one_letter().is_some()) {
        if residue.id.icode.is_some() || residue.id.seq < 1 {
            continue;
        }
        table.entry(residue.id.seq as usize).or_default().1 = residue.b_factor();
    }

    let fmt = |v: Option<f64>, digits: usize| match v {
        Some(v) => format!("{:.*}", digits, v),
        None => "NA".to_string(),
    };

    let mut writer = am2pdb::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("position\tam\tplddt\n"))?;
    for (position, (am, plddt)) in &table {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\n",
            position,
            fmt(*am, 3),
            fmt(*plddt, 2)
        ))?;
    }
    writer.flush()?;

    Ok(())
}
