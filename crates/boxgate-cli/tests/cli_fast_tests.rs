//! Fast CLI tests using assert_cmd.
//! These test the binary directly without needing a container runtime.

#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but works fine

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_flag() {
    Command::cargo_bin("boxgate")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Authenticated container gateway"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("boxgate")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

#[test]
fn test_subcommand_help() {
    for args in [
        vec!["serve", "--help"],
        vec!["client", "--help"],
        vec!["client", "create", "--help"],
        vec!["client", "start", "--help"],
        vec!["client", "info", "--help"],
        vec!["client", "demo", "--help"],
    ] {
        Command::cargo_bin("boxgate")
            .unwrap()
            .args(&args)
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

#[test]
fn test_unknown_subcommand_fails() {
    Command::cargo_bin("boxgate")
        .unwrap()
        .arg("nonexistent-subcommand")
        .assert()
        .failure();
}

#[test]
fn test_serve_without_sign_key_fails() {
    // A missing config file falls back to defaults, which have no sign key;
    // the gateway must refuse to start rather than serve unauthenticated.
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("missing.toml");

    Command::cargo_bin("boxgate")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "serve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sign_key"));
}

#[test]
fn test_client_without_sign_key_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("missing.toml");

    Command::cargo_bin("boxgate")
        .unwrap()
        .args([
            "--config",
            config.to_str().unwrap(),
            "client",
            "info",
            "some-container-id",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signing key"));
}

#[test]
fn test_client_fails_when_gateway_unreachable() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("missing.toml");

    Command::cargo_bin("boxgate")
        .unwrap()
        .args([
            "--config",
            config.to_str().unwrap(),
            "client",
            "--addr",
            "127.0.0.1:1",
            "--sign-key",
            "secret",
            "info",
            "some-container-id",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not reach the gateway"));
}
