//! Integration tests for the `fpatch` binary.
//!
//! These tests run the CLI with an isolated environment: no token
//! variables, and a temporary home so no real configuration is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for running fpatch in a clean environment.
fn fpatch(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fpatch").unwrap();
    cmd.env_remove("FORGEPATCH_TOKEN")
        .env_remove("GITHUB_TOKEN")
        .env_remove("FORGEPATCH_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    fpatch(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replace"))
        .stdout(predicate::str::contains("branch"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    fpatch(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fpatch"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    fpatch(&home)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fpatch"));
}

#[test]
fn missing_token_is_reported() {
    let home = TempDir::new().unwrap();
    fpatch(&home)
        .args(["replace", "octocat/hello", "auto", "foo", "bar"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error:"))
        .stderr(predicate::str::contains("FORGEPATCH_TOKEN"));
}

#[test]
fn invalid_repository_is_reported() {
    let home = TempDir::new().unwrap();
    fpatch(&home)
        .args(["branch", "not-a-repo", "auto", "--token", "ghp_0123456789abcdef"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid repository 'not-a-repo'"));
}

#[test]
fn malformed_file_key_is_reported() {
    let home = TempDir::new().unwrap();
    fpatch(&home)
        .args(["replace", "o/r", "auto", "foo", "bar", "--file", "a.txt:"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("remote path is empty"));
}

#[test]
fn broken_config_is_reported() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "unknown_key = true\n").unwrap();

    fpatch(&home)
        .args(["--config", config.to_str().unwrap(), "branch", "o/r", "auto"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[tokio::test(flavor = "multi_thread")]
async fn branch_command_reports_existing_branch() {
    let server = MockServer::start().await;
    let sha = "a".repeat(40);
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/git/ref/heads/auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": "refs/heads/auto",
            "object": { "type": "commit", "sha": sha }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let home = TempDir::new().unwrap();
    let output = tokio::task::spawn_blocking(move || {
        fpatch(&home)
            .env("FORGEPATCH_TOKEN", "ghp_0123456789abcdef")
            .args(["branch", "octocat/hello", "auto", "--api-base", &uri])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found auto at aaaaaaa"), "stdout: {}", stdout);
}
