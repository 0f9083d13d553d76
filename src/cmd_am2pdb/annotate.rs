use am2pdb::libs::pipeline::{annotate_structure, apply_annotations, AnnotateConfig};
use am2pdb::libs::report::write_report;
use clap::*;
use std::io::Write;
use tracing::{info, warn};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("annotate")
        .about("Transfers AlphaMissense scores onto a PDB structure")
        .after_help(
            r###"
This command writes the mean pathogenicity of each reference position into the
B-factor column (61-66) of every atom of the structure residue aligned to it.

Process:
1. Averages all substitutions per reference position (3 decimals)
2. Aligns each chain's standard residues to the reference (affine-gap local alignment)
3. Maps residues inside identical blocks to reference positions
4. Writes each residue's score into all of its atoms

Notes:
* Only the first model builds the residue hierarchy; atoms of other models get the sentinel
* Residues outside the alignment, waters and ligands get the sentinel
* Unknown chains in --chain are skipped with a warning
* The variant table may be the per-protein CSV or the genome-wide TSV, plain or .gz
* Reads from stdin if an input file is 'stdin'

Examples:
1. Annotate all chains:
   am2pdb annotate 1abc.pdb P04637.fasta P04637.csv -o 1abc.am.pdb

2. Chains A and C only, with the alignment report:
   am2pdb annotate 1abc.pdb P04637.fasta P04637.csv -c A,C --report aln.txt

3. Cheaper gaps, four threads:
   am2pdb annotate 1abc.pdb P04637.fasta P04637.csv --gap-open -2 -p 4

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
        .arg(
            Arg::new("variants")
                .required(true)
                .index(3)
                .help("AlphaMissense variant table"),
        )
        .arg(super::arg_chain())
        .arg(super::arg_sentinel())
        .args(super::args_align())
        .arg(
            Arg::new("min_coverage")
                .long("min-coverage")
                .num_args(1)
                .default_value("0.5")
                .value_parser(value_parser!(f64))
                .help("Warn about chains with a smaller mapped fraction"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .num_args(1)
                .help("Also write the alignment report to this file"),
        )
        .arg(super::arg_parallel())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let config = AnnotateConfig {
        align: super::align_params(args),
        sentinel: *args.get_one::<f64>("sentinel").unwrap(),
        min_coverage: *args.get_one::<f64>("min_coverage").unwrap(),
        chains: super::chains(args),
    };
    super::set_threads(args)?;

    //----------------------------
    // Inputs
    //----------------------------
    let scores = super::load_scores(args.get_one::<String>("variants").unwrap())?;
    let reference = super::load_reference(args.get_one::<String>("reference").unwrap())?;
    let mut structure = super::load_structure(args.get_one::<String>("pdb").unwrap())?;
    if let Some(last) = scores.max_position() {
        if last > reference.len() {
            warn!(
                "Variant positions reach {}, beyond the reference length {}",
                last,
                reference.len()
            );
        }
    }

    //----------------------------
    // Ops
    //----------------------------
    let results = annotate_structure(&structure, &reference, &scores, &config)?;
    apply_annotations(&mut structure, &results, config.sentinel)?;

    //----------------------------
    // Output
    //----------------------------
    let mut writer = am2pdb::writer(args.get_one::<String>("outfile").unwrap())?;
    structure.write_to(&mut writer)?;
    writer.flush()?;

    if let Some(path) = args.get_one::<String>("report") {
        let mut report = am2pdb::writer(path)?;
        write_report(&mut report, &reference, &results)?;
        report.flush()?;
        info!("Alignment report written to {}", path);
    }

    Ok(())
}
