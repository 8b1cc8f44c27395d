//! Integration tests for the deploy → inspect → decrypt → remove lifecycle.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use serde_json::Value;

use crate::support::{Sandbox, exists};

fn json_stdout(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json")
}

#[test]
fn test_deploy_writes_bundle_key_and_record() {
    let sandbox = Sandbox::new();
    sandbox
        .deploy("prod")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deployed 'prod' (3 agents)"))
        .stdout(predicate::str::contains("Key file:"));

    assert!(exists(&sandbox.bundle("prod")));
    assert!(exists(&sandbox.key("prod")));

    let vault = sandbox.vault_json();
    let workspace = vault["workspace"]["id"].as_str().expect("workspace id");
    let record = &vault["deployments"]["prod"];
    assert_eq!(record["workspace_id"], workspace);
    assert_eq!(record["agents"].as_array().unwrap().len(), 3);
    assert!(record["certs"]["log-sentinel"].is_object());

    let key = std::fs::read_to_string(sandbox.key("prod")).expect("key");
    assert_eq!(key.trim(), record["swarm_key"]);
}

#[cfg(unix)]
#[test]
fn test_deploy_key_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::new();
    sandbox.deploy("prod").assert().success();
    let mode = std::fs::metadata(sandbox.key("prod")).expect("stat").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_deploy_json_reports_paths() {
    let sandbox = Sandbox::new();
    let value = json_stdout(&sandbox.deploy("prod").arg("--json").output().expect("run"));
    assert_eq!(value["label"], "prod");
    assert_eq!(value["agents"], 3);
    assert_eq!(value["replaced"], false);
    assert!(value.get("swarm_key").is_none());
    assert_eq!(
        value["bundle"].as_str().unwrap(),
        sandbox.bundle("prod").display().to_string()
    );
}

#[test]
fn test_deploy_key_in_memory_prints_key_and_skips_file() {
    let sandbox = Sandbox::new();
    let value = json_stdout(
        &sandbox
            .deploy("prod")
            .args(["--json", "--key-in-memory"])
            .output()
            .expect("run"),
    );
    assert!(value["swarm_key"].is_string());
    assert!(!exists(&sandbox.key("prod")));
}

#[test]
fn test_full_lifecycle() {
    let sandbox = Sandbox::new();
    sandbox.deploy("alpha").assert().success();
    sandbox.deploy("beta").assert().success();

    let listed = json_stdout(
        &sandbox
            .swarm()
            .args(["--json", "deployments", "list"])
            .output()
            .expect("run"),
    );
    let labels: Vec<&str> = listed["deployments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["alpha", "beta"]);

    let shown = json_stdout(
        &sandbox
            .swarm()
            .args(["--json", "deployments", "show", "alpha"])
            .output()
            .expect("run"),
    );
    assert_eq!(shown["bundle"], "intact");
    assert!(!shown.to_string().contains("swarm_key"));
    assert!(!shown.to_string().contains("PRIVATE KEY"));

    let directive = sandbox
        .swarm()
        .args(["decrypt", "--label", "alpha"])
        .arg(sandbox.bundle("alpha"))
        .output()
        .expect("run");
    let directive = json_stdout(&directive);
    assert_eq!(directive["agent_tree"]["universal_id"], "matrix");
    assert_eq!(directive["agent_tree"]["children"].as_array().unwrap().len(), 2);

    sandbox
        .swarm()
        .args(["--yes", "deployments", "remove", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed deployment 'alpha'"));
    assert!(!exists(&sandbox.bundle("alpha")));
    assert!(!exists(&sandbox.key("alpha")));
    assert!(exists(&sandbox.bundle("beta")));
    assert!(sandbox.vault_json()["deployments"].get("alpha").is_none());
}

#[test]
fn test_decrypt_with_key_file_to_output_file() {
    let sandbox = Sandbox::new();
    sandbox.deploy("prod").assert().success();
    let out = sandbox.path("directive.json");
    sandbox
        .swarm()
        .arg("decrypt")
        .arg(sandbox.bundle("prod"))
        .arg("--key")
        .arg(sandbox.key("prod"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let directive: Value =
        serde_json::from_slice(&std::fs::read(&out).expect("written")).expect("json");
    let oracle = directive["agent_tree"]["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["universal_id"] == "oracle")
        .expect("oracle");
    assert_eq!(oracle["config"]["poll"], 5);
}

#[test]
fn test_decrypt_detects_tampered_bundle() {
    let sandbox = Sandbox::new();
    sandbox.deploy("prod").assert().success();
    let mut bytes = std::fs::read(sandbox.bundle("prod")).expect("bundle");
    bytes.extend_from_slice(b"\n");
    std::fs::write(sandbox.bundle("prod"), bytes).expect("tamper");

    sandbox
        .swarm()
        .args(["decrypt", "--label", "prod"])
        .arg(sandbox.bundle("prod"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("hash mismatch"));

    let shown = json_stdout(
        &sandbox
            .swarm()
            .args(["--json", "deployments", "show", "prod"])
            .output()
            .expect("run"),
    );
    assert_eq!(shown["bundle"], "modified");
}

#[test]
fn test_duplicate_label_is_refused() {
    let sandbox = Sandbox::new();
    sandbox.deploy("prod").assert().success();
    let before = std::fs::read(sandbox.bundle("prod")).expect("bundle");

    let output = sandbox.deploy("prod").arg("--json").output().expect("run");
    assert!(!output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["code"], "ALREADY_EXISTS");
    assert_eq!(std::fs::read(sandbox.bundle("prod")).expect("bundle"), before);
}

#[test]
fn test_force_replaces_deployment_with_new_key() {
    let sandbox = Sandbox::new();
    sandbox.deploy("prod").assert().success();
    let old_key = sandbox.vault_json()["deployments"]["prod"]["swarm_key"].clone();

    let value = json_stdout(
        &sandbox
            .deploy("prod")
            .args(["--json", "--force", "--yes"])
            .output()
            .expect("run"),
    );
    assert_eq!(value["replaced"], true);
    let vault = sandbox.vault_json();
    assert_ne!(vault["deployments"]["prod"]["swarm_key"], old_key);
    assert_eq!(vault["deployments"].as_object().unwrap().len(), 1);
}

#[test]
fn test_invalid_label_is_refused_before_any_write() {
    let sandbox = Sandbox::new();
    let output = sandbox.deploy("../escape").arg("--json").output().expect("run");
    assert!(!output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "INVALID_LABEL");
    assert!(!sandbox.path("vault.json").exists());
    assert!(!sandbox.path("deployments").exists());
}

#[test]
fn test_hand_edited_config_out_of_range_is_refused() {
    let sandbox = Sandbox::new();
    let mut config = std::fs::read_to_string(sandbox.config_path()).expect("read config");
    config.push_str("  validity_days: 4000000000\n");
    std::fs::write(sandbox.config_path(), config).expect("write config");

    let output = sandbox.deploy("prod").arg("--json").output().expect("run");
    assert!(!output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["code"], "INVALID_CONFIG");
    assert!(value["message"].as_str().unwrap_or_default().contains("crypto.validity_days"));
    assert!(!sandbox.path("vault.json").exists());
    assert!(!sandbox.path("deployments").exists());
}

#[test]
fn test_embed_sources_with_missing_file_fails_cleanly() {
    let sandbox = Sandbox::new();
    let sources = sandbox.path("agents");
    std::fs::create_dir_all(sources.join("matrix")).expect("mkdir");
    std::fs::write(sources.join("matrix/matrix.py"), "print('matrix')").expect("write");

    let output = sandbox
        .deploy("prod")
        .args(["--json", "--embed-sources", "--source-root"])
        .arg(&sources)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["code"], "PACKAGING_FAILED");
    assert!(!exists(&sandbox.bundle("prod")));
    assert!(!sandbox.path("vault.json").exists());
}

#[test]
fn test_remove_unknown_label_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .swarm()
        .args(["--yes", "deployments", "remove", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_list_empty_vault() {
    let sandbox = Sandbox::new();
    sandbox
        .swarm()
        .args(["deployments", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No deployments"));
}
