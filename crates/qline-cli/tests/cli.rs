//! End-to-end tests for the `qline` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const QUOTE: &str = "ACME Manufacturing Inc.\n\
                     Quote #: Q-2024-001\n\
                     Description Qty Unit Price Amount\n\
                     BASE MATERIAL    6    240.92    1445.52\n\
                     SOLDER ASSEMBLY  6    213.42    1280.52\n\
                     TOOLING SETUP    1    2000.00   2000.00\n\
                     Subtotal: $4,726.04\n";

/// A `qline` command whose user config directory is an empty temp dir.
fn qline(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("qline").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path());
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn process_text_file_as_json() {
    let home = TempDir::new().unwrap();
    let input = write(home.path(), "quote.txt", QUOTE);

    let output = qline(&home).arg("process").arg(&input).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["numberOfGroups"], 2);
    assert_eq!(json["summary"]["totalCost"], "4726.04");
    assert_eq!(json["groups"][1]["lineItems"][0]["description"], "BASE MATERIAL");
}

#[test]
fn process_csv_to_output_file() {
    let home = TempDir::new().unwrap();
    let input = write(home.path(), "quote.txt", QUOTE);
    let out = home.path().join("items.csv");

    qline(&home)
        .args(["process", "-f", "csv", "-o"])
        .arg(&out)
        .arg(&input)
        .assert()
        .success();

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("group_quantity,description,quantity,unit_price,cost\n"));
    assert!(csv.contains("1,TOOLING SETUP,1,2000.00,2000.00"));
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn process_uses_config_default_currency() {
    let home = TempDir::new().unwrap();
    let input = write(home.path(), "quote.txt", "Widget Assembly 2 50.00 100.00\n");
    let config = write(
        home.path(),
        "config.json",
        r#"{"extraction": {"default_currency": "EUR"}}"#,
    );

    qline(&home)
        .arg("--config")
        .arg(&config)
        .args(["process", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Quote summary (EUR)"))
        .stdout(predicate::str::contains("100.00 €"));
}

#[test]
fn process_falls_back_to_alt_text() {
    let home = TempDir::new().unwrap();
    let blank = write(home.path(), "blank.txt", "  \n");
    let ocr = write(home.path(), "ocr.txt", QUOTE);

    qline(&home)
        .arg("process")
        .arg(&blank)
        .arg("--alt-text")
        .arg(&ocr)
        .arg("--show-confidence")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"numberOfGroups\":2"))
        .stderr(predicate::str::contains("failed"))
        .stderr(predicate::str::contains("Source: text:"));
}

#[test]
fn process_rejects_unknown_extension() {
    let home = TempDir::new().unwrap();
    let input = write(home.path(), "scan.png", "not really an image");

    qline(&home)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn process_missing_file_fails() {
    let home = TempDir::new().unwrap();

    qline(&home)
        .args(["process", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_invalid_pdf_fails() {
    let home = TempDir::new().unwrap();
    let input = write(home.path(), "broken.pdf", "%PDF-garbage");

    qline(&home)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no text source produced usable text"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let home = TempDir::new().unwrap();
    let inputs = home.path().join("in");
    let outputs = home.path().join("out");
    fs::create_dir_all(&inputs).unwrap();
    write(&inputs, "a.txt", QUOTE);
    write(&inputs, "b.txt", "");
    write(&inputs, "notes.md", QUOTE);

    let pattern = format!("{}/*", inputs.display());
    qline(&home)
        .args(["batch", &pattern, "--summary", "--continue-on-error", "-o"])
        .arg(&outputs)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stdout(predicate::str::contains("Failed files:"));

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(outputs.join("a.json")).unwrap()).unwrap();
    assert_eq!(result["summary"]["finalTotal"], "4726.04");
    assert!(!outputs.join("b.json").exists());

    let summary = fs::read_to_string(outputs.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("a.txt,success,2,3,4726.04,4726.04,"));
    assert!(rows[2].starts_with("b.txt,error,"));
}

#[test]
fn batch_stops_on_first_error_by_default() {
    let home = TempDir::new().unwrap();
    write(home.path(), "empty.txt", "");

    let pattern = format!("{}/*.txt", home.path().display());
    qline(&home)
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn batch_without_matches_fails() {
    let home = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", home.path().display());

    qline(&home)
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_init_then_refuses_overwrite() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("qline.json");

    qline(&home)
        .args(["config", "init", "-o"])
        .arg(&path)
        .assert()
        .success();
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["extraction"]["min_confidence"], 0.5);

    qline(&home)
        .args(["config", "init", "-o"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    qline(&home)
        .args(["config", "init", "--force", "-o"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn config_get_reads_nested_key() {
    let home = TempDir::new().unwrap();

    qline(&home)
        .args(["config", "get", "pdf.min_text_length"])
        .assert()
        .success()
        .stdout("50\n");

    qline(&home)
        .args(["config", "get", "pdf.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn config_path_reports_missing_file() {
    let home = TempDir::new().unwrap();

    qline(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file:"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn process_rejects_invalid_config() {
    let home = TempDir::new().unwrap();
    let input = write(home.path(), "quote.txt", QUOTE);
    let config = write(
        home.path(),
        "config.json",
        r#"{"extraction": {"min_confidence": 2.0}}"#,
    );

    qline(&home)
        .arg("-c")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_confidence"));
}
