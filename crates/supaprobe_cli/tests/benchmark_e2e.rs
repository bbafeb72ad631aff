//! End-to-end tests for the `supaprobe benchmark` command.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::MockServer;

fn supaprobe(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_supaprobe"));
    cmd.current_dir(dir.path())
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("SUPABASE_SERVICE_ROLE_KEY");
    cmd
}

#[test]
fn list_shows_every_scenario_without_a_target() {
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args(["benchmark", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anon-data-exposure"))
        .stdout(predicate::str::contains("auth-hardening"))
        .stdout(predicate::str::contains("availability"));
}

#[test]
fn unknown_scenario_exits_with_error() {
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args([
            "benchmark",
            "--url",
            "https://abc.supabase.co",
            "--anon-key",
            "anon",
            "--scenario",
            "no-such-scenario",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no-such-scenario"));
}

#[test]
fn single_scenario_writes_report() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("bench.json");

    supaprobe(&dir)
        .args([
            "benchmark",
            "--url",
            server.uri().as_str(),
            "--anon-key",
            "anon",
            "--scenario",
            "secrets-and-keys",
            "--output",
            output.to_str().unwrap(),
            "--exit-zero",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Secrets and keys"))
        .stdout(predicate::str::contains("score"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["tool"], "supaprobe");
    assert_eq!(report["scenarios"].as_array().unwrap().len(), 1);
    assert_eq!(report["scenarios"][0]["id"], "secrets-and-keys");
    assert!(report["summary"]["total"].as_u64().unwrap() > 0);
    assert!(report["byScenario"]["secrets-and-keys"].is_object());
}
