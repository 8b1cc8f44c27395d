//! Integration tests for `swarm config`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::support::swarm;

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    swarm()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    let (_dir, path) = temp_config_path();
    swarm()
        .args(["config", "show"])
        .env("SWARM_CONFIG", &path)
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("crypto.ca_bits"))
        .stdout(predicate::str::contains("{name}/{name}.py"))
        .stdout(predicate::str::contains("SWARM_CONFIG"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let (_dir, path) = temp_config_path();
    swarm()
        .args(["config", "show"])
        .env("SWARM_CONFIG", &path)
        .assert()
        .success();
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_persists_value() {
    let (_dir, path) = temp_config_path();
    swarm()
        .args(["config", "set", "crypto.ca_bits", "3072"])
        .env("SWARM_CONFIG", &path)
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("crypto.ca_bits"));

    let content = std::fs::read_to_string(&path).expect("config written");
    assert!(content.contains("ca_bits: 3072"), "got: {content}");

    let output = swarm()
        .args(["--json", "config", "show"])
        .env("SWARM_CONFIG", &path)
        .output()
        .expect("run");
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["config"]["crypto"]["ca_bits"], 3072);
}

#[cfg(unix)]
#[test]
fn test_config_set_writes_owner_only_file() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = temp_config_path();
    swarm()
        .args(["config", "set", "deploy.source_template", "agents/{name}.py"])
        .env("SWARM_CONFIG", &path)
        .assert()
        .success();
    let mode = std::fs::metadata(&path).expect("stat").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_config_set_unknown_key_fails() {
    let (_dir, path) = temp_config_path();
    swarm()
        .args(["config", "set", "vault.colour", "blue"])
        .env("SWARM_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"))
        .stderr(predicate::str::contains("crypto.ca_bits"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_key_size_fails_with_code() {
    let (_dir, path) = temp_config_path();
    let output = swarm()
        .args(["--json", "config", "set", "crypto.leaf_bits", "1024"])
        .env("SWARM_CONFIG", &path)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["code"], "INVALID_CONFIG");
}

#[test]
fn test_config_set_rejects_traversing_template() {
    let (_dir, path) = temp_config_path();
    swarm()
        .args(["config", "set", "deploy.source_template", "../{name}.py"])
        .env("SWARM_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}
