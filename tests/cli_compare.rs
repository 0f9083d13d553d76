use assert_cmd::Command;
use std::path::PathBuf;

fn get_input_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/am2pdb");
    path.push(filename);
    path
}

#[test]
fn command_compare_model() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("am2pdb")?;
    let output = cmd
        .arg("compare")
        .arg(get_input_path("model.pdb"))
        .arg(get_input_path("variants.csv"))
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "position\tam\tplddt");
    assert_eq!(lines.len(), 40);
    assert_eq!(lines[1], "1\t0.310\t81.25");
    assert_eq!(lines[10], "10\t0.400\t90.25");
    assert_eq!(lines[11], "11\t0.410\tNA");
    assert!(!lines.iter().any(|l| l.starts_with("30\t")));
    Ok(())
}

#[test]
fn command_compare_unknown_chain() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("am2pdb")?;
    cmd.arg("compare")
        .arg(get_input_path("model.pdb"))
        .arg(get_input_path("variants.csv"))
        .arg("-c")
        .arg("Q");
    cmd.assert().failure();
    Ok(())
}
