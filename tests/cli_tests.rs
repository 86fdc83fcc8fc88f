//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the absim binary
fn absim_cmd() -> Command {
    Command::cargo_bin("absim").unwrap()
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    absim_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("A/B testing simulator"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("persona"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version_command() {
    absim_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("absim"))
        .stdout(predicate::str::contains("Build Information"))
        .stdout(predicate::str::contains("Git Hash"))
        .stdout(predicate::str::contains("Target"));
}

#[test]
fn test_short_version_flag() {
    absim_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("absim"));
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_default() {
    let temp = TempDir::new().unwrap();
    absim_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("[vision]"))
        .stdout(predicate::str::contains("[evaluation]"))
        .stdout(predicate::str::contains("[logging]"))
        .stdout(predicate::str::contains("[storage]"));
}

#[test]
fn test_config_init_and_validate() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("absim.toml");

    absim_cmd()
        .arg("config")
        .arg("init")
        .arg("--path")
        .arg(config_path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    assert!(config_path.exists());

    absim_cmd()
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("absim.toml");

    absim_cmd()
        .arg("config")
        .arg("init")
        .arg("--path")
        .arg(config_path.to_str().unwrap())
        .assert()
        .success();

    absim_cmd()
        .arg("config")
        .arg("init")
        .arg("--path")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_validate_missing_file() {
    absim_cmd()
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg("/nonexistent/absim.toml")
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("not found"));
}

// ─────────────────────────────────────────────────────────────────
// Persona Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_persona_list() {
    absim_cmd()
        .arg("persona")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sarah"))
        .stdout(predicate::str::contains("jake"))
        .stdout(predicate::str::contains("robert"));
}

#[test]
fn test_persona_show() {
    absim_cmd()
        .arg("persona")
        .arg("show")
        .arg("sarah")
        .assert()
        .success()
        .stdout(predicate::str::contains("cautious"))
        .stdout(predicate::str::contains("$200"))
        .stdout(predicate::str::contains("safety"));
}

#[test]
fn test_persona_show_unknown() {
    absim_cmd()
        .arg("persona")
        .arg("show")
        .arg("alice")
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("Unknown persona"));
}

// ─────────────────────────────────────────────────────────────────
// Run Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_run_requires_both_images() {
    absim_cmd()
        .arg("run")
        .arg("https://example.com/a.png")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_run_rejects_invalid_image_reference() {
    let temp = TempDir::new().unwrap();
    absim_cmd()
        .current_dir(temp.path())
        .env("ABSIM_VISION_BACKEND", "mock")
        .arg("run")
        .arg("notes.txt")
        .arg("https://example.com/b.png")
        .arg("--no-save")
        .assert()
        .failure()
        .code(30)
        .stderr(predicate::str::contains("Invalid image reference"));
}

#[test]
fn test_run_rejects_unknown_persona() {
    let temp = TempDir::new().unwrap();
    absim_cmd()
        .current_dir(temp.path())
        .env("ABSIM_VISION_BACKEND", "mock")
        .arg("run")
        .arg("https://example.com/a.png")
        .arg("https://example.com/b.png")
        .arg("--personas")
        .arg("sarah,alice")
        .arg("--no-save")
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("Unknown persona"));
}

#[test]
fn test_run_with_mock_backend() {
    let temp = TempDir::new().unwrap();
    absim_cmd()
        .current_dir(temp.path())
        .env("ABSIM_VISION_BACKEND", "mock")
        .arg("--quiet")
        .arg("run")
        .arg("https://example.com/a.png")
        .arg("https://example.com/b.png")
        .arg("--no-save")
        .assert()
        .success()
        .stdout(predicate::str::contains("A/B Test Results"))
        .stdout(predicate::str::contains("Winner:"))
        .stdout(predicate::str::contains("Confidence:"))
        .stdout(predicate::str::contains("sarah"))
        .stdout(predicate::str::contains("jake"))
        .stdout(predicate::str::contains("robert"));
}

#[test]
fn test_run_saves_report() {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().join("results");

    absim_cmd()
        .current_dir(temp.path())
        .env("ABSIM_VISION_BACKEND", "mock")
        .arg("--quiet")
        .arg("run")
        .arg("https://example.com/a.png")
        .arg("https://example.com/b.png")
        .arg("--output")
        .arg(out_dir.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Report saved"));

    let entries: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let name = entries[0].as_ref().unwrap().file_name();
    let name = name.to_string_lossy();
    assert!(name.starts_with("ab_test_") && name.ends_with(".json"));
}

#[test]
fn test_run_detailed_output() {
    let temp = TempDir::new().unwrap();
    absim_cmd()
        .current_dir(temp.path())
        .env("ABSIM_VISION_BACKEND", "mock")
        .arg("--quiet")
        .arg("run")
        .arg("https://example.com/a.png")
        .arg("https://example.com/b.png")
        .arg("--detailed")
        .arg("--no-save")
        .assert()
        .success()
        .stdout(predicate::str::contains("Verdict details"));
}
