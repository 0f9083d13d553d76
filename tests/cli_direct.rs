use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn get_input_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/am2pdb");
    path.push(filename);
    path
}

fn ca_slots(pdb: &str) -> Vec<String> {
    pdb.lines()
        .filter(|l| l.starts_with("ATOM") && &l[12..16] == " CA ")
        .map(|l| l[60..66].to_string())
        .collect()
}

#[test]
fn command_direct_model() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("am2pdb")?;
    let output = cmd
        .arg("direct")
        .arg(get_input_path("model.pdb"))
        .arg(get_input_path("variants.csv"))
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(
        ca_slots(&stdout),
        vec![
            "  0.31", "  0.32", "  0.33", "  0.34", "  0.35", "  0.36", "  0.37", "  0.38",
            "  0.39", "  0.40"
        ]
    );
    assert!(stdout.starts_with("HEADER    PREDICTED MODEL\n"));
    Ok(())
}

#[test]
fn command_direct_numbering_mismatch() -> anyhow::Result<()> {
    // residues 101.. have no reference position with a score
    let mut cmd = Command::cargo_bin("am2pdb")?;
    let output = cmd
        .arg("direct")
        .arg(get_input_path("structure.pdb"))
        .arg(get_input_path("variants.csv"))
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(ca_slots(&stdout).iter().all(|v| v == " -1.00"));
    Ok(())
}

#[test]
fn command_direct_help() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("am2pdb")?;
    cmd.arg("direct").arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("numbered like the reference"));
    Ok(())
}
