use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = "Txn Date,Narration,Withdrawal,Deposit,Closing Balance\n\
2024-03-01,Coffee Shop,4.50,,120.00\n\
2024-03-02,Salary,,1000.00,1120.00\n";

/// Command isolated from the user's real config directory.
fn bankstmt(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bankstmt").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn extract_csv_as_json() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "march.csv", STATEMENT);

    let output = bankstmt(dir.path()).arg("extract").arg(&input).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["filename"], "march.csv");
    assert_eq!(json["size"], STATEMENT.len());
    assert_eq!(json["strategy"], "spreadsheet");
    assert_eq!(json["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(json["transactions"][0]["date"], "2024-03-01");
    assert_eq!(json["transactions"][0]["description"], "Coffee Shop");
    assert_eq!(json["transactions"][0]["debit"], 4.5);
    assert_eq!(json["transactions"][1]["credit"], 1000.0);
    assert!(json.get("ocr_text").is_none());
}

#[test]
fn extract_csv_as_csv() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "march.csv", STATEMENT);

    bankstmt(dir.path())
        .args(["extract", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("date,description,debit,credit,balance"))
        .stdout(predicate::str::contains("2024-03-01,Coffee Shop,4.50,0,120.00"));
}

#[test]
fn extract_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "march.csv", STATEMENT);
    let out = dir.path().join("out.json");

    bankstmt(dir.path())
        .arg("extract")
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert!(fs::read_to_string(out).unwrap().contains("\"Salary\""));
}

#[test]
fn empty_statement_fails_unless_allowed() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "empty.csv", "Date,Description,Debit,Credit,Balance\n");

    bankstmt(dir.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No transactions found"));

    bankstmt(dir.path())
        .arg("extract")
        .arg(&input)
        .arg("--allow-empty")
        .assert()
        .success();
}

#[test]
fn missing_amount_columns_are_reported() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bad.csv", "Date,Description,Reference\n2024-01-02,Salary,X1\n");

    bankstmt(dir.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required columns: debit, credit"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "statement.txt", STATEMENT);

    bankstmt(dir.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported document format: txt"));
}

#[test]
fn config_file_changes_extraction() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "paid.csv", "Date,Details,Paid Out,Balance\n2024-01-02,Rent,500.00,100.00\n");
    let config = write(
        &dir,
        "config.json",
        r#"{"extraction": {"extra_column_patterns": {"debit": ["paid out"]}}}"#,
    );

    bankstmt(dir.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure();

    bankstmt(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["extract", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-02,Rent,500.00,0,100.00"));
}

#[test]
fn config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("cfg").join("config.json");

    bankstmt(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    bankstmt(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.date_order", "month_first"])
        .assert()
        .success();

    bankstmt(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.date_order"])
        .assert()
        .success()
        .stdout(predicate::str::contains("month_first"));

    bankstmt(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.date_order", "sideways"])
        .assert()
        .failure();
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    write(&dir, "jan.csv", STATEMENT);
    write(&dir, "feb.csv", "Date,Description,Credit\n02/02/2024,Refund,12.50\n");
    let out = dir.path().join("out");

    bankstmt(dir.path())
        .arg("batch")
        .arg(format!("{}/*.csv", dir.path().display()))
        .arg("-o")
        .arg(&out)
        .args(["-f", "csv", "-j", "2", "--summary"])
        .assert()
        .success();

    assert!(fs::read_to_string(out.join("jan.csv")).unwrap().contains("Coffee Shop"));
    assert!(fs::read_to_string(out.join("feb.csv")).unwrap().contains("2024-02-02,Refund,0,12.50,0"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("jan.csv,success,spreadsheet,2"));
    assert!(summary.contains("feb.csv,success,spreadsheet,1"));
}
