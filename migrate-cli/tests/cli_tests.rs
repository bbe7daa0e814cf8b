//! Integration tests for the `migrate-export` / `migrate-import` binaries.
//!
//! These only exercise paths that don't require a live analytics
//! platform instance: help text, argument validation, and the
//! credential-combination check that runs before any network call.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn export_cmd() -> Command {
    Command::cargo_bin("migrate-export").unwrap()
}

#[allow(deprecated)]
fn import_cmd() -> Command {
    Command::cargo_bin("migrate-import").unwrap()
}

#[test]
fn export_help_lists_flags() {
    export_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source-url"))
        .stdout(predicate::str::contains("--export-dir"))
        .stdout(predicate::str::contains("--include-dashboards"))
        .stdout(predicate::str::contains("--root-collection-ids"));
}

#[test]
fn import_help_lists_flags() {
    import_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--db-map"))
        .stdout(predicate::str::contains("--conflict-strategy"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--apply-permissions"));
}

#[test]
fn export_missing_required_args_fails() {
    export_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn import_rejects_unknown_conflict_strategy() {
    let tmp = TempDir::new().unwrap();
    import_cmd()
        .args([
            "--target-url",
            "https://target.example.com",
            "--session-token",
            "tok",
            "--export-dir",
            tmp.path().to_str().unwrap(),
            "--db-map",
            tmp.path().join("db_map.json").to_str().unwrap(),
            "--conflict-strategy",
            "bogus",
        ])
        .assert()
        .failure();
}

#[test]
fn import_rejects_ambiguous_credentials_with_exit_code_two() {
    let tmp = TempDir::new().unwrap();
    import_cmd()
        .args([
            "--target-url",
            "https://target.example.com",
            "--session-token",
            "tok",
            "--api-key",
            "key",
            "--export-dir",
            tmp.path().to_str().unwrap(),
            "--db-map",
            tmp.path().join("db_map.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("exactly one of"));
}

#[test]
fn import_rejects_no_credentials_with_exit_code_two() {
    let tmp = TempDir::new().unwrap();
    import_cmd()
        .args([
            "--target-url",
            "https://target.example.com",
            "--export-dir",
            tmp.path().to_str().unwrap(),
            "--db-map",
            tmp.path().join("db_map.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn export_version_flag() {
    export_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate-export"));
}
