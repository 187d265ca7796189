//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn studyctl() -> Command {
    let mut cmd = Command::cargo_bin("studyctl").unwrap();
    // Keep the developer's environment out of the tests
    cmd.env_remove("DATABASE_URL")
        .env_remove("STUDYCTL_CONFIG")
        .env_remove("STUDYCTL_TTS_API_KEY");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    studyctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_serve_help() {
    studyctl()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"))
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn test_user_add_help() {
    studyctl()
        .args(["user", "add", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Organization name"))
        .stdout(predicate::str::contains("owner"));
}

#[test]
fn test_token_issue_help() {
    studyctl()
        .args(["token", "issue", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Days until the token expires"));
}

#[test]
fn test_completions_bash() {
    studyctl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("studyctl"));
}

#[test]
fn test_config_show_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[server]\nbind = \"0.0.0.0:8080\"\n\n[synthesizer]\nenabled = true\napi_key = \"AIza-secret\"\n",
    )
    .unwrap();

    studyctl()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.0.0.0:8080"))
        .stdout(predicate::str::contains("AIza-secret").not());
}

#[test]
fn test_missing_explicit_config_fails() {
    studyctl()
        .args(["--config", "/nonexistent/studyctl.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_migrate_without_database_url_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    studyctl()
        .arg("--config")
        .arg(&path)
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}
