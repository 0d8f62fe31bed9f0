//! Smoke tests for the formprobe CLI
//!
//! These run the real binary. None of them needs a browser.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the formprobe binary, isolated from the caller's env
fn formprobe() -> Command {
    let mut cmd = Command::cargo_bin("formprobe").expect("formprobe binary should exist");
    cmd.env_remove("BASE_URL")
        .env_remove("FORMPROBE_WORKERS")
        .env_remove("FORMPROBE_RETRIES")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    formprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    formprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("registration form"))
        .stdout(predicate::str::contains("test"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_no_args_shows_help() {
    formprobe().assert().failure();
}

#[test]
fn test_test_subcommand_help_lists_env_fallbacks() {
    formprobe()
        .args(["test", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BASE_URL"))
        .stdout(predicate::str::contains("--project"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_prints_catalog() {
    formprobe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("submits_valid_registration"))
        .stdout(predicate::str::contains("reports_required_fields"))
        .stdout(predicate::str::contains("rejects_password_without_uppercase"));
}

#[test]
fn test_list_json_filtered() {
    let output = formprobe()
        .args(["list", "--json", "--filter", "password"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let scenarios: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = scenarios
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| n.contains("password")));
}

#[test]
fn test_list_unknown_filter_fails() {
    formprobe()
        .args(["list", "--filter", "no_such_scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_reads_base_url_from_env() {
    let output = formprobe()
        .arg("config")
        .env("BASE_URL", "https://staging.example.com")
        .env("FORMPROBE_RETRIES", "2")
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["base_url"], "https://staging.example.com");
    assert_eq!(config["retries"], 2);
    assert_eq!(config["timeouts"]["action_ms"], 5000);
    assert_eq!(config["timeouts"]["navigation_ms"], 10000);
    assert_eq!(config["timeouts"]["scenario_ms"], 30000);
    let workers = config["workers"].as_u64().unwrap();
    assert!((1..=4).contains(&workers));
}

#[test]
fn test_config_flag_overrides_env() {
    let output = formprobe()
        .args(["config", "--base-url", "http://localhost:3000"])
        .env("BASE_URL", "https://staging.example.com")
        .output()
        .unwrap();
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["base_url"], "http://localhost:3000");
}

#[test]
fn test_config_rejects_invalid_base_url() {
    formprobe()
        .args(["config", "--base-url", "localhost:8080"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base URL"));
}

// ============================================================================
// test
// ============================================================================

#[test]
fn test_unknown_project_rejected() {
    formprobe()
        .args(["test", "--project", "opera"])
        .assert()
        .failure();
}

#[test]
fn test_test_unknown_filter_fails_before_launch() {
    let temp = TempDir::new().unwrap();
    formprobe()
        .args(["test", "--filter", "no_such_scenario", "--output"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches"));
    assert!(!temp.path().join("results.json").exists());
}

#[test]
fn test_unreachable_engine_fails_and_writes_reports() {
    let temp = TempDir::new().unwrap();
    formprobe()
        .args([
            "test",
            "--project",
            "firefox",
            "--gecko-webdriver",
            "http://127.0.0.1:9",
            "--filter",
            "submits_valid",
            "--video",
            "false",
            "--quiet",
            "--output",
        ])
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 of 1 scenario(s) failed"));

    let results = fs::read_to_string(temp.path().join("results.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&results).unwrap();
    assert_eq!(report["results"][0]["status"], "failed");
    assert_eq!(report["results"][0]["error_kind"], "browser_launch");
    assert!(temp.path().join("report.html").exists());
    assert!(temp.path().join("junit.xml").exists());
}
