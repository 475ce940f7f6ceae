//! Argument parsing, version output and configuration errors.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pocket() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kubectl-pocket"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("POCKET_LOG");
    cmd
}

// --- Help and version ---

#[test]
fn test_cli_no_args_shows_help() {
    pocket()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Throwaway database clients"));
}

#[test]
fn test_cli_help_lists_commands() {
    pocket()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("test"))
        .stdout(predicate::str::contains("pf"));
}

#[test]
fn test_pf_help_shows_arguments() {
    pocket()
        .args(["pf", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[LOCAL_PORT]"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    pocket()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kubectl-pocket"));
}

#[test]
fn test_version_command_shows_version() {
    pocket()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kubectl-pocket 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = pocket()
        .args(["version", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["version"], "0.1.0");
}

#[test]
fn test_version_ignores_broken_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeouts: [").unwrap();

    pocket()
        .env("POCKET_CONFIG", &path)
        .arg("version")
        .assert()
        .success();
}

// --- Argument validation ---

#[test]
fn test_unknown_backend_is_rejected() {
    pocket()
        .args(["pf", "mysql"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'mysql'"));
}

#[test]
fn test_backend_aliases_are_accepted_by_parser() {
    pocket()
        .args(["test", "postgresql", "--help"])
        .assert()
        .success();
}

#[test]
fn test_missing_connection_string_is_rejected() {
    pocket()
        .args(["test", "redis"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<CONNECTION>"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    pocket()
        .args(["--timeout", "0", "test", "redis", "redis-svc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("at least 1 second"));
}

#[test]
fn test_timeout_accepts_a_unit_suffix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeouts:\n  poll_interval_secs: 0\n").unwrap();

    // Parsing succeeds, so the run gets as far as loading the config.
    pocket()
        .env("POCKET_CONFIG", &path)
        .args(["--timeout", "30s", "test", "redis", "redis-svc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("poll_interval_secs"));
}

#[test]
fn test_timeout_without_a_number_is_rejected() {
    pocket()
        .args(["--timeout", "soon", "test", "redis", "redis-svc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected seconds"));
}

// --- Configuration ---

#[test]
fn test_invalid_config_fails_before_touching_the_cluster() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeouts:\n  poll_interval_secs: 0\n").unwrap();

    pocket()
        .env("POCKET_CONFIG", &path)
        .args(["test", "redis", "redis-svc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("poll_interval_secs"));
}

#[test]
fn test_invalid_config_error_is_json_in_json_mode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeouts:\n  cleanup_secs: 0\n").unwrap();

    pocket()
        .env("POCKET_CONFIG", &path)
        .args(["--json", "pf", "redis"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"error\": true"))
        .stdout(predicate::str::contains("cleanup_secs"));
}
