extern crate clap;
use clap::*;
use tracing_subscriber::EnvFilter;

mod cmd_am2pdb;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the PDB or table output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let app = Command::new("am2pdb")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`am2pdb` - AlphaMissense scores on protein structures")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_am2pdb::annotate::make_subcommand())
        .subcommand(cmd_am2pdb::average::make_subcommand())
        .subcommand(cmd_am2pdb::align::make_subcommand())
        .subcommand(cmd_am2pdb::direct::make_subcommand())
        .subcommand(cmd_am2pdb::compare::make_subcommand())
        .subcommand(cmd_am2pdb::matrix::make_subcommand())
        .after_help(
            r###"Subcommands:

* Structures:
    * annotate - Align chains to the reference and write scores into the B-factor column
    * direct   - Write scores into a model already numbered like the reference
    * align    - Alignment report only

* Tables:
    * average  - Mean pathogenicity per reference position
    * compare  - Mean pathogenicity next to per-residue B-factor (pLDDT)
    * matrix   - Score of every substitution, one row per position

Log verbosity follows RUST_LOG (default: info).

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("annotate", sub_matches)) => cmd_am2pdb::annotate::execute(sub_matches),
        Some(("average", sub_matches)) => cmd_am2pdb::average::execute(sub_matches),
        Some(("align", sub_matches)) => cmd_am2pdb::align::execute(sub_matches),
        Some(("direct", sub_matches)) => cmd_am2pdb::direct::execute(sub_matches),
        Some(("compare", sub_matches)) => cmd_am2pdb::compare::execute(sub_matches),
        Some(("matrix", sub_matches)) => cmd_am2pdb::matrix::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
