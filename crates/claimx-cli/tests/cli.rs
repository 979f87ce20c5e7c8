//! Integration tests for the `claimx` binary.

#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
    "fileName": "claim-0001.pdf",
    "fields": [
        {
            "name": "charges",
            "cropping": {"confidence": 0.91},
            "analysis": {"words": [
                {"content": "99", "bbox": [0.10, 1.00, 0.2, 0.1]},
                {"content": "1", "bbox": [0.35, 1.00, 0.05, 0.1]},
                {"content": "00", "bbox": [0.50, 1.01, 0.2, 0.1]},
                {"content": "40", "bbox": [0.10, 1.33, 0.2, 0.1]},
                {"content": "100", "bbox": [0.50, 1.33, 0.3, 0.1]}
            ]}
        },
        {
            "name": "qty",
            "cropping": {"confidence": 0.85},
            "analysis": {"words": [
                {"content": "1", "bbox": [0.1, 1.00, 0.1, 0.1]},
                {"content": "00", "bbox": [0.3, 1.00, 0.1, 0.1]},
                {"content": "2", "bbox": [0.1, 1.33, 0.1, 0.1]}
            ]}
        },
        {
            "name": "total_charges",
            "cropping": {"confidence": 0.88},
            "analysis": {"words": [
                {"content": "150", "bbox": [0.1, 0.5, 0.3, 0.1]},
                {"content": "00", "bbox": [0.5, 0.5, 0.2, 0.1]}
            ]}
        },
        {
            "name": "birth_date",
            "cropping": {"confidence": -1.0},
            "analysis": {"words": []}
        }
    ]
}"#;

fn claimx() -> Command {
    Command::cargo_bin("claimx").expect("binary 'claimx' should be built")
}

/// Temp dir with a default config file, so tests never read the user's.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    claimx()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();

    (dir, config)
}

fn write_document(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, DOCUMENT).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    claimx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn process_json_output() {
    let (dir, config) = workspace();
    let input = write_document(dir.path(), "claim.json");

    claimx()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""charges_1": "99.00""#))
        .stdout(predicate::str::contains(r#""charges_2": "40.00""#))
        .stdout(predicate::str::contains(r#""qty_1": "1""#))
        .stdout(predicate::str::contains("birth_date_1").not());
}

#[test]
fn process_csv_output_uses_column_layout() {
    let (dir, config) = workspace();
    let input = write_document(dir.path(), "claim.json");
    let output = dir.path().join("out.csv");

    claimx()
        .arg("--config")
        .arg(&config)
        .args(["process", "-f", "csv", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("fileName,insured_id_1,birth_date_1,"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("claim-0001.pdf,"));
    assert!(row.contains(",99.00,40.00,"));
}

#[test]
fn process_validate_reports_total_mismatch() {
    let (dir, config) = workspace();
    let input = write_document(dir.path(), "claim.json");

    claimx()
        .arg("--config")
        .arg(&config)
        .args(["process", "--validate", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("does not match total charges"));
}

#[test]
fn process_missing_input_fails() {
    let (dir, config) = workspace();

    claimx()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_rejects_unknown_field_in_strict_mode() {
    let (dir, config) = workspace();
    let input = dir.path().join("odd.json");
    fs::write(
        &input,
        r#"{"fileName": "odd.pdf", "fields": [
            {"name": "signature", "cropping": {"confidence": 0.5}, "analysis": {"words": []}}
        ]}"#,
    )
    .unwrap();

    claimx()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("signature"));
}

#[test]
fn batch_writes_results_csv() {
    let (dir, config) = workspace();
    let inputs = dir.path().join("inputs");
    let out = dir.path().join("out");
    fs::create_dir_all(&inputs).unwrap();
    write_document(&inputs, "a.json");
    write_document(&inputs, "b.json");
    fs::write(inputs.join("broken.json"), "{not json").unwrap();

    claimx()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(&inputs)
        .args(["-j", "2", "--summary", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"))
        .stdout(predicate::str::contains("broken.json"));

    let results = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("results_"))
        })
        .expect("results csv should be written");

    let csv = fs::read_to_string(results).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert_eq!(csv.matches("99.00").count(), 2);
}

#[test]
fn evaluate_writes_report() {
    let dir = TempDir::new().unwrap();
    let truth = dir.path().join("truth.csv");
    let results = dir.path().join("results.csv");
    fs::write(&truth, "fileName,charges_1,qty_1\na.pdf,99.00,1\nb.pdf,40.00,\n").unwrap();
    fs::write(&results, "fileName,charges_1,qty_1\na.pdf,99.00,1\nb.pdf,4.00,\n").unwrap();

    claimx()
        .arg("evaluate")
        .arg(&truth)
        .arg(&results)
        .arg("-o")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("charges_1"))
        .stdout(predicate::str::contains("50.0%"));

    let report = fs::read_to_string(dir.path().join("results_eval.csv")).unwrap();
    assert!(report.starts_with("fileName,sum,charges_1,qty_1"));
    assert!(report.contains("b.pdf,1.0000,1.0000,0.0000"));
}

#[test]
fn config_get_and_path() {
    let (_dir, config) = workspace();

    claimx()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    claimx()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "fields.5.name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("charges"));

    claimx()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let (_dir, config) = workspace();

    claimx()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
