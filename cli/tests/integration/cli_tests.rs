//! Integration tests for argument parsing and global flags.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::support::{Sandbox, swarm};

#[test]
fn test_no_args_shows_help() {
    swarm()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    swarm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("decrypt"))
        .stdout(predicate::str::contains("deployments"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    swarm()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    let output = swarm().args(["--json", "version"]).output().expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_command_fails() {
    swarm()
        .arg("launch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_embed_sources_requires_source_root() {
    let sandbox = Sandbox::new();
    sandbox
        .deploy("prod")
        .arg("--embed-sources")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source-root"));
    assert!(!sandbox.path("vault.json").exists());
}

#[test]
fn test_decrypt_requires_key_or_label() {
    let sandbox = Sandbox::new();
    sandbox
        .swarm()
        .args(["decrypt", "bundle.enc.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--key").or(predicate::str::contains("--label")));
}

#[test]
fn test_validate_reports_summary() {
    let sandbox = Sandbox::new();
    sandbox
        .swarm()
        .arg("validate")
        .arg("--tree")
        .arg(sandbox.path("tree.json"))
        .arg("--registry")
        .arg(sandbox.path("registry.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Agents:"))
        .stdout(predicate::str::contains("ready to deploy"));
}

#[test]
fn test_validate_json_counts() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .swarm()
        .args(["--json", "validate", "--tree"])
        .arg(sandbox.path("tree.json"))
        .arg("--registry")
        .arg(sandbox.path("registry.json"))
        .output()
        .expect("run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["valid"], true);
    assert_eq!(value["summary"]["agents"], 3);
}

#[test]
fn test_validate_without_registry_fails_on_required_serial() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .swarm()
        .args(["--json", "validate", "--tree"])
        .arg(sandbox.path("tree.json"))
        .output()
        .expect("run");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "REGISTRY_VALIDATION_FAILED");
    assert!(value["message"].as_str().unwrap().contains("oracle"));
}

#[test]
fn test_malformed_tree_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.write("broken.json", &serde_json::json!({"nodes": []}));
    sandbox
        .swarm()
        .arg("validate")
        .arg("--tree")
        .arg(sandbox.path("broken.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("empty"));
}
