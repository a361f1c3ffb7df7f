//! End-to-end tests for the `trail` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn trail(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trail").unwrap();
    cmd.env("AUDIT_TRAIL_DATA_DIR", data_dir)
        .env_remove("AUDIT_TRAIL_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_diff_reports_added_set_element() {
    let dir = TempDir::new().unwrap();
    let old = write(dir.path(), "old.json", r#"{"skillSet": ["Java", "Python"]}"#);
    let new = write(dir.path(), "new.json", r#"{"skillSet": ["Python", "Java", "SQL"]}"#);

    trail(dir.path())
        .arg("diff")
        .arg(&old)
        .arg(&new)
        .arg("--sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("skillSet.2"))
        .stdout(predicate::str::contains("added"))
        .stdout(predicate::str::contains("SQL"))
        .stdout(predicate::str::contains("1 change(s)"));
}

#[test]
fn test_diff_payload_output() {
    let dir = TempDir::new().unwrap();
    let old = write(dir.path(), "old.json", r#"{"firstName": "Jane", "id": 1}"#);
    let new = write(dir.path(), "new.json", r#"{"firstName": "John", "id": 2}"#);

    trail(dir.path())
        .args(["diff", "--payload"])
        .arg(&old)
        .arg(&new)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""firstName": "Jane->John""#))
        .stdout(predicate::str::contains("\"id\"").not());
}

#[test]
fn test_diff_identical_documents() {
    let dir = TempDir::new().unwrap();
    let doc = write(dir.path(), "doc.json", r#"{"tags": ["a", "b"]}"#);

    trail(dir.path())
        .arg("diff")
        .arg(&doc)
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences."));
}

#[test]
fn test_flatten_prints_paths() {
    let dir = TempDir::new().unwrap();
    let doc = write(
        dir.path(),
        "doc.json",
        r#"{"address": {"city": "Springfield"}, "phones": []}"#,
    );

    trail(dir.path())
        .arg("flatten")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("address.city = \"Springfield\""))
        .stdout(predicate::str::contains("phones = []"));
}

#[test]
fn test_record_then_history() {
    let dir = TempDir::new().unwrap();
    let before = write(dir.path(), "before.json", r#"{"firstName": "Jane"}"#);
    let after = write(dir.path(), "after.json", r#"{"firstName": "John"}"#);

    trail(dir.path())
        .args(["audit", "record", "Customer", "42", "--after"])
        .arg(&before)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded Create for Customer/42"));

    trail(dir.path())
        .args(["audit", "record", "Customer", "42", "--before"])
        .arg(&before)
        .arg("--after")
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded Update for Customer/42"));

    trail(dir.path())
        .args(["audit", "history", "Customer", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Create"))
        .stdout(predicate::str::contains("Update"))
        .stdout(predicate::str::contains("2 record(s)"));

    trail(dir.path())
        .args(["audit", "history", "Customer", "42", "--details"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane->John"));
}

#[test]
fn test_record_without_changes() {
    let dir = TempDir::new().unwrap();
    let doc = write(dir.path(), "doc.json", r#"{"firstName": "Jane"}"#);

    trail(dir.path())
        .args(["audit", "record", "Customer", "7", "--before"])
        .arg(&doc)
        .arg("--after")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes detected"));

    trail(dir.path())
        .args(["audit", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit records found."));
}

#[test]
fn test_record_requires_a_snapshot() {
    let dir = TempDir::new().unwrap();

    trail(dir.path())
        .args(["audit", "record", "Customer", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--before"));
}

#[test]
fn test_excluded_entity_is_not_recorded() {
    let dir = TempDir::new().unwrap();
    let doc = write(dir.path(), "doc.json", r#"{"path": "/health"}"#);

    trail(dir.path())
        .args(["audit", "record", "HttpTraceAuditLog", "1", "--after"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("excluded"));
}

#[test]
fn test_show_unknown_record() {
    let dir = TempDir::new().unwrap();

    trail(dir.path())
        .args(["audit", "show", "aud-00000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AuditRecord not found"));
}

#[test]
fn test_export_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let doc = write(dir.path(), "doc.json", r#"{"skillSet": ["Java"]}"#);

    trail(dir.path())
        .args(["audit", "record", "Employee", "9", "--sets", "--after"])
        .arg(&doc)
        .assert()
        .success();

    let output = trail(dir.path())
        .args(["export", "all", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let export: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(export["schema_version"], "1.0.0");
    assert_eq!(export["records"].as_array().unwrap().len(), 1);
    assert_eq!(export["records"][0]["entityName"], "Employee");
    assert_eq!(export["records"][0]["differenceList"]["skillSet.0"], "+Java");
}

#[test]
fn test_reconcile_on_empty_trail() {
    let dir = TempDir::new().unwrap();

    trail(dir.path())
        .args(["audit", "reconcile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reconciled 0 latest flag(s)"));
}

#[test]
fn test_init_and_config() {
    let dir = TempDir::new().unwrap();

    trail(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));
    assert!(dir.path().join("config.json").exists());

    trail(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Similarity threshold: 0.7"))
        .stdout(predicate::str::contains("Max depth:            5"));
}

#[test]
fn test_export_then_import_into_fresh_trail() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let doc = write(source.path(), "doc.json", r#"{"firstName": "Jane"}"#);
    let export = source.path().join("trail.json");

    trail(source.path())
        .args(["audit", "record", "Customer", "42", "--after"])
        .arg(&doc)
        .assert()
        .success();
    trail(source.path())
        .args(["export", "all", "--output"])
        .arg(&export)
        .assert()
        .success();

    trail(target.path())
        .arg("import")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 of 1 record(s)"));

    trail(target.path())
        .args(["audit", "history", "Customer", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"));
}
