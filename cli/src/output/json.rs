//! JSON output helpers.
//!
//! `JsonRenderer` prints one pretty JSON document per command on stdout.
//! `format_error` builds the error object used by all `--json` code paths
//! when a command fails.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use swarm_common::DeploymentRecord;

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::deployments::BundleState;
use crate::domain::SwarmConfig;
use crate::domain::constraint::Preflight;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable renderer.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_deploy(&self, outcome: &DeployOutcome) -> Result<()> {
        let record = &outcome.record;
        let mut obj = json!({
            "label": record.label,
            "workspace_id": record.workspace_id,
            "deployed_at": record.deployed_at,
            "replaced": outcome.replaced,
            "agents": record.agents.len(),
            "bundle": outcome.bundle_path,
            "key_file": outcome.key_path,
            "encrypted_hash": record.encrypted_hash,
            "directive_hash": record.directive_hash,
            "embedded": outcome.embedded,
            "stamped": outcome.stamped,
            "issues": outcome.issues,
            "invalid_agents": outcome.invalid_agents,
        });
        if outcome.key_path.is_none() {
            obj["swarm_key"] = Value::String(record.swarm_key.clone());
        }
        print(&obj)
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_validate(&self, summary: &Preflight) -> Result<()> {
        print(&json!({
            "valid": summary.issues.is_empty(),
            "summary": summary,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_deployment_list(
        &self,
        deployments: &BTreeMap<String, DeploymentRecord>,
    ) -> Result<()> {
        let list: Vec<Value> = deployments
            .values()
            .map(|r| {
                json!({
                    "label": r.label,
                    "workspace_id": r.workspace_id,
                    "deployed_at": r.deployed_at,
                    "agents": r.agents.len(),
                    "encrypted_path": r.encrypted_path,
                })
            })
            .collect();
        print(&json!({ "deployments": list }))
    }

    /// Key material is left out; only material classes per agent are listed.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_deployment(&self, record: &DeploymentRecord, state: BundleState) -> Result<()> {
        let agents: Vec<Value> = record
            .agents
            .iter()
            .map(|a| {
                let material: Vec<&String> = record
                    .certs
                    .get(&a.universal_id)
                    .map(|m| m.keys().collect())
                    .unwrap_or_default();
                json!({
                    "universal_id": a.universal_id,
                    "name": a.name,
                    "material": material,
                })
            })
            .collect();
        print(&json!({
            "label": record.label,
            "workspace_id": record.workspace_id,
            "deployed_at": record.deployed_at,
            "encrypted_path": record.encrypted_path,
            "encrypted_hash": record.encrypted_hash,
            "directive_hash": record.directive_hash,
            "bundle": bundle_state_str(state),
            "agents": agents,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_removed(&self, record: &DeploymentRecord) -> Result<()> {
        print(&json!({ "removed": record.label }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &SwarmConfig, path: &Path) -> Result<()> {
        print(&json!({ "path": path, "config": config }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config_set(&self, key: &str, value: &str) -> Result<()> {
        print(&json!({ "key": key, "value": value }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }
}

fn bundle_state_str(state: BundleState) -> &'static str {
    match state {
        BundleState::Intact => "intact",
        BundleState::Modified => "modified",
        BundleState::Unreadable => "unreadable",
    }
}

fn print(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}
