//! End-to-end tests for the `supaprobe init` command.

use std::fs;

use assert_cmd::Command;
use insta::assert_snapshot;
use predicates::prelude::*;
use tempfile::TempDir;

fn supaprobe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_supaprobe"))
}

#[test]
fn creates_config_file() {
    let dir = TempDir::new().unwrap();

    supaprobe().args(["init", "--yes"]).current_dir(dir.path()).assert().success();

    let content = fs::read_to_string(dir.path().join(".supaprobe.toml")).unwrap();
    assert!(content.contains("severity = \"low\""));
    assert!(content.contains("SUPABASE_ANON_KEY"));
}

#[test]
fn minimal_config_content_snapshot() {
    let dir = TempDir::new().unwrap();

    supaprobe()
        .args(["init", "--yes", "--minimal"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    let config = fs::read_to_string(dir.path().join(".supaprobe.toml")).unwrap();
    assert_snapshot!("init_minimal_config", config);
}

#[test]
fn existing_config_is_kept_without_prompt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".supaprobe.toml");
    fs::write(&path, "severity = \"critical\"\n").unwrap();

    supaprobe()
        .args(["init", "--yes"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&path).unwrap(), "severity = \"critical\"\n");
}

#[test]
fn output_flag_specifies_path() {
    let dir = TempDir::new().unwrap();
    let custom_path = dir.path().join("custom-config.toml");

    supaprobe()
        .args(["init", "--yes", "--output", custom_path.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .success();

    assert!(custom_path.exists());
    assert!(!dir.path().join(".supaprobe.toml").exists());
}

#[test]
fn init_then_scan_reads_config() {
    let dir = TempDir::new().unwrap();

    supaprobe().args(["init", "--yes"]).current_dir(dir.path()).assert().success();

    supaprobe()
        .arg("scan")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("SUPABASE_SERVICE_ROLE_KEY")
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no target URL"));
}
