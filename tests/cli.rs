//! Integration tests for the CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn depcop() -> Command {
    Command::cargo_bin("depcop").unwrap()
}

#[test]
fn test_cli_scan_help() {
    depcop()
        .arg("scan")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-on"))
        .stdout(predicate::str::contains("--exit-code"));
}

#[test]
fn test_cli_missing_lockfile() {
    let dir = TempDir::new().unwrap();

    depcop()
        .arg("scan")
        .arg("--project")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing"))
        .stderr(predicate::str::contains("composer.lock"));
}

#[test]
fn test_cli_invalid_format() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("composer.lock"), r#"{"packages": []}"#).unwrap();

    depcop()
        .args(["scan", "--format", "sarif", "--project"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid format 'sarif'"));
}

#[test]
fn test_cli_invalid_config_value() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("composer.lock"), r#"{"packages": []}"#).unwrap();
    fs::write(dir.path().join("depcop.toml"), "stale-months = 0\n").unwrap();

    depcop()
        .args(["scan", "--project"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stale-months"));
}

#[test]
fn test_cli_rejects_unknown_severity() {
    depcop()
        .args(["scan", "--fail-on", "severe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid severity"));
}

#[test]
fn test_cli_empty_lock_is_clean() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("composer.lock"),
        r#"{"packages": [], "packages-dev": []}"#,
    )
    .unwrap();
    let advisories = dir.path().join("audit.json");
    fs::write(&advisories, r#"{"advisories": []}"#).unwrap();

    depcop()
        .args(["scan", "--format", "json", "--no-cache", "--project"])
        .arg(dir.path())
        .arg("--advisories")
        .arg(&advisories)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"packages_scanned\": 0"));
}

#[test]
fn test_cli_config_init_and_path() {
    let dir = TempDir::new().unwrap();

    depcop()
        .args(["config", "--path", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("depcop.toml"));

    depcop()
        .args(["config", "--init", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let written = fs::read_to_string(dir.path().join("depcop.toml")).unwrap();
    assert!(written.contains("stale-months = 18"));
}
