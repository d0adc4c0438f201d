use std::fs;
use std::process::Command;

use serde_json::Value;

const BIN: &str = env!("CARGO_BIN_EXE_msamp-sim");

#[test]
fn quota_prints_canonical_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = dir.path().join("probs.txt");
    fs::write(&table, "a 0.5\nb 0.3\nc 0.2\n").expect("write table");

    let output = Command::new(BIN)
        .args(["quota", "--model-probabilities"])
        .arg(&table)
        .args(["--number-samples", "10", "--json"])
        .output()
        .expect("run msamp-sim quota");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["counts"]["a"], 5);
    assert_eq!(value["counts"]["b"], 3);
    assert_eq!(value["counts"]["c"], 2);
}

#[test]
fn quota_rejects_negative_total() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = dir.path().join("probs.txt");
    fs::write(&table, "a 1.0\n").expect("write table");

    let status = Command::new(BIN)
        .args(["quota", "--model-probabilities"])
        .arg(&table)
        .args(["--number-samples", "-3"])
        .status()
        .expect("run msamp-sim quota");
    assert!(!status.success());
}

#[cfg(unix)]
#[test]
fn sample_from_prior_logs_and_writes_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = dir.path().join("probs.txt");
    fs::write(&table, "a 0.5\nb 0.5\n").expect("write table");
    let summary_json = dir.path().join("summary.json");

    let output = Command::new(BIN)
        .arg("sample")
        .arg("--database-directory")
        .arg(dir.path())
        .args(["--inferem-directory", "inferem_0-10"])
        .arg("--model-probabilities")
        .arg(&table)
        .args(["--number-samples", "4", "--this-is-prior", "--nprocs", "2"])
        .args(["--generator", "sh", "--generator-arg", "-c"])
        .args([
            "--generator-arg",
            r#"i=0; while [ "$i" -lt "$2" ]; do echo "$1-$i"; i=$((i+1)); done"#,
            "--generator-arg",
            "msamp-generator",
        ])
        .arg("--json")
        .arg(&summary_json)
        .output()
        .expect("run msamp-sim sample");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.starts_with("SETTINGS:\n"));
    assert!(stdout.contains("samples produced >> 4"));

    let log = fs::read_to_string(dir.path().join("summary.log")).expect("log");
    assert!(log.contains("*** start: generating machine samples ***"));
    assert!(log.contains("*** end: generating machine samples ***"));

    let value: Value = serde_json::from_slice(&fs::read(&summary_json).expect("json file"))
        .expect("summary json");
    assert_eq!(value["total_produced"], 4);
    assert_eq!(value["mode"]["kind"], "prior");
}

#[test]
fn sample_requires_settings_source() {
    let status = Command::new(BIN)
        .args(["sample", "--generator", "true"])
        .status()
        .expect("run msamp-sim sample");
    assert!(!status.success());
}
