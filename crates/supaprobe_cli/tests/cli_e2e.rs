//! End-to-end tests for global CLI behaviour (help, version, etc.).

use assert_cmd::Command;
use predicates::prelude::*;

fn supaprobe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_supaprobe"))
}

#[test]
fn help_shows_usage() {
    supaprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("exploitable misconfigurations"));
}

#[test]
fn help_lists_commands() {
    supaprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("attacks"))
        .stdout(predicate::str::contains("benchmark"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_format() {
    let output = supaprobe().arg("--version").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stdout.contains("supaprobe") && stdout.chars().any(|c| c.is_ascii_digit()),
        "version should contain 'supaprobe' and a version number"
    );
}

#[test]
fn no_args_shows_help() {
    supaprobe().assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn invalid_command_fails() {
    supaprobe().arg("invalid-command").assert().failure();
}

#[test]
fn scan_help_mentions_env_vars() {
    supaprobe()
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUPABASE_URL"))
        .stdout(predicate::str::contains("SUPABASE_ANON_KEY"));
}
