//! End-to-end tests for the `supaprobe scan` command.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn supaprobe(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_supaprobe"));
    cmd.current_dir(dir.path())
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("SUPABASE_SERVICE_ROLE_KEY");
    cmd
}

/// A project whose `users` table leaks rows and whose `profiles` table is locked down.
fn leaky_project(rt: &Runtime) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1, "email": "a@b.c"}])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        server
    })
}

#[test]
fn exit_one_when_breached() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args(["scan", "--url", server.uri().as_str(), "--anon-key", "anon", "--attack", "rls/users-read"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("rls/users-read"))
        .stdout(predicate::str::contains("1 breach"));
}

#[test]
fn exit_zero_when_secure() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args(["scan", "--url", server.uri().as_str(), "--anon-key", "anon", "--attack", "rls/profiles-read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No breaches"));
}

#[test]
fn exit_zero_flag_overrides_breaches() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args([
            "scan",
            "--url",
            server.uri().as_str(),
            "--anon-key",
            "anon",
            "--attack",
            "rls/users-read",
            "--exit-zero",
        ])
        .assert()
        .success();
}

#[test]
fn env_vars_supply_target() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .env("SUPABASE_URL", server.uri())
        .env("SUPABASE_ANON_KEY", "anon")
        .args(["scan", "--attack", "rls/users-read"])
        .assert()
        .code(1);
}

#[test]
fn json_output_is_a_report() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();

    let output = supaprobe(&dir)
        .args([
            "scan",
            "--url",
            server.uri().as_str(),
            "--anon-key",
            "anon",
            "--attack",
            "rls/users-read",
            "--attack",
            "rls/profiles-read",
            "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tool"], "supaprobe");
    assert_eq!(report["summary"]["total"], 2);
    assert_eq!(report["summary"]["breached"], 1);
    assert_eq!(report["summary"]["secure"], 1);
    assert_eq!(report["results"][0]["attackId"], "rls/users-read");
    assert_eq!(report["results"][0]["status"], "breached");
    assert_eq!(report["results"][1]["attackId"], "rls/profiles-read");
}

#[test]
fn report_flag_writes_json_file() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");

    supaprobe(&dir)
        .args([
            "scan",
            "--url",
            server.uri().as_str(),
            "--anon-key",
            "anon",
            "--attack",
            "rls/profiles-read",
            "--report",
            report_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("report written to"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["secure"], 1);
}

#[test]
fn config_file_supplies_target() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".supaprobe.toml"),
        format!("target_url = \"{}\"\nanon_key = \"anon\"\n", server.uri()),
    )
    .unwrap();

    supaprobe(&dir).args(["scan", "--attack", "rls/users-read"]).assert().code(1);
}

#[test]
fn disabled_attack_is_not_run() {
    let rt = Runtime::new().unwrap();
    let server = leaky_project(&rt);
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".supaprobe.toml"),
        "disabled_attacks = [\"rls/users-read\"]\n",
    )
    .unwrap();

    supaprobe(&dir)
        .args(["scan", "--url", server.uri().as_str(), "--anon-key", "anon", "--attack", "rls/users-read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no attacks match"));
}

#[test]
fn unreachable_target_reports_errors() {
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args([
            "scan",
            "--url",
            "http://127.0.0.1:9",
            "--anon-key",
            "anon",
            "--attack",
            "rls/users-read",
            "--timeout",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 could not complete"));
}

#[test]
fn missing_url_exits_with_error() {
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args(["scan", "--anon-key", "anon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no target URL"));
}

#[test]
fn missing_anon_key_exits_with_error() {
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args(["scan", "--url", "https://abc.supabase.co"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no anon key"));
}

#[test]
fn unknown_attack_id_exits_with_error() {
    let dir = TempDir::new().unwrap();

    supaprobe(&dir)
        .args(["scan", "--url", "https://abc.supabase.co", "--anon-key", "anon", "--attack", "rls/nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("rls/nope"));
}
