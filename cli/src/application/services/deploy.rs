//! Application service: the deploy pipeline.
//!
//! label check → compile → package → stage artifacts → vault batch → promote.
//! Artifacts are staged beside their final paths and moved into place only
//! after the vault accepts the record. A failed deploy discards the staged
//! files, so neither the vault nor the artifacts of an existing record change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use swarm_common::{DeploymentRecord, Registry, TreeDocument};

use crate::application::ports::{ArtifactWriter, ProgressReporter, SourceReader, VaultBackend};
use crate::application::services::package::{PackageOptions, package};
use crate::application::services::vault_commit::Vault;
use crate::domain::bundle::sha256_hex;
use crate::domain::compile::compile;
use crate::domain::constraint::ConstraintIssue;
use crate::domain::crypto::CryptoSettings;
use crate::domain::error::DeployError;
use crate::domain::validate::validate_label;
use crate::domain::vault::{SECTION_DEPLOYMENTS, SECTION_WORKSPACE};
use crate::domain::workspace::{new_workspace, validate_workspace_id};

pub const BUNDLE_SUFFIX: &str = ".enc.json";
pub const KEY_DIR: &str = "keys";
pub const KEY_SUFFIX: &str = ".key";

pub struct DeployRequest<'a> {
    pub label: &'a str,
    pub tree: TreeDocument,
    pub registry: &'a Registry,
    pub crypto: &'a CryptoSettings,
    pub out_dir: &'a Path,
    pub package: PackageOptions<'a>,
    /// Keep the swarm key out of `keys/`; it is returned in the outcome instead.
    pub key_in_memory: bool,
    pub overwrite: bool,
}

#[derive(Debug)]
pub struct DeployOutcome {
    pub record: DeploymentRecord,
    pub bundle_path: PathBuf,
    pub key_path: Option<PathBuf>,
    pub issues: Vec<ConstraintIssue>,
    pub invalid_agents: Vec<String>,
    pub embedded: usize,
    pub stamped: usize,
    /// Whether this deploy replaced an existing record.
    pub replaced: bool,
}

#[must_use]
pub fn bundle_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("{label}{BUNDLE_SUFFIX}"))
}

#[must_use]
pub fn key_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(KEY_DIR).join(format!("{label}{KEY_SUFFIX}"))
}

/// Runs the full deploy pipeline.
///
/// # Errors
///
/// Returns an error if the label is invalid or taken, compilation or
/// packaging fails, an artifact cannot be written, or the vault refuses the
/// record. Staged artifacts are discarded in every failure case that happens
/// before the record is committed.
pub fn deploy<B: VaultBackend>(
    request: DeployRequest<'_>,
    vault: &mut Vault<B>,
    sources: &impl SourceReader,
    writer: &impl ArtifactWriter,
    reporter: &impl ProgressReporter,
) -> Result<DeployOutcome> {
    deploy_at(request, vault, sources, writer, reporter, Utc::now())
}

/// [`deploy`] with an explicit clock.
///
/// # Errors
///
/// See [`deploy`].
pub fn deploy_at<B: VaultBackend>(
    request: DeployRequest<'_>,
    vault: &mut Vault<B>,
    sources: &impl SourceReader,
    writer: &impl ArtifactWriter,
    reporter: &impl ProgressReporter,
    now: DateTime<Utc>,
) -> Result<DeployOutcome> {
    let label = request.label;
    validate_label(label)?;
    let replaced = vault.deployment(label)?.is_some();
    if replaced && !request.overwrite {
        return Err(DeployError::AlreadyExists(label.to_string()).into());
    }

    reporter.step("resolving constraints and minting key material...");
    let artifacts = compile(request.tree.nodes, request.registry, request.crypto, now)?;
    for issue in &artifacts.issues {
        reporter.warn(&issue.to_string());
    }

    reporter.step("sealing directive...");
    let packaged = package(&artifacts.directive, &request.package, sources)?;

    reporter.step("writing artifacts...");
    let bundle_path = bundle_path(request.out_dir, label);
    let bundle_bytes = serde_json::to_vec_pretty(&packaged.sealed.bundle)
        .context("failed to serialize encrypted bundle")?;
    let staged_bundle = writer
        .stage_bundle(&bundle_path, &bundle_bytes)
        .with_context(|| format!("failed to write {}", bundle_path.display()))?;

    let mut staged = vec![(staged_bundle, bundle_path.clone())];
    let key_path = if request.key_in_memory {
        None
    } else {
        let path = key_path(request.out_dir, label);
        match writer.stage_key(&path, &packaged.sealed.swarm_key) {
            Ok(tmp) => staged.push((tmp, path.clone())),
            Err(e) => {
                discard(writer, &staged);
                return Err(e).with_context(|| format!("failed to write {}", path.display()));
            }
        }
        Some(path)
    };

    let record = DeploymentRecord {
        label: label.to_string(),
        workspace_id: String::new(),
        deployed_at: now,
        swarm_key: packaged.sealed.swarm_key.clone(),
        encrypted_path: bundle_path.display().to_string(),
        encrypted_hash: sha256_hex(&bundle_bytes),
        directive_hash: packaged.sealed.directive_hash.clone(),
        agents: artifacts.deployment.agents(),
        certs: artifacts.deployment.certs,
    };

    reporter.step("committing deployment record...");
    let record = match commit_record(vault, record, now) {
        Ok(record) => record,
        Err(e) => {
            discard(writer, &staged);
            return Err(e);
        }
    };
    promote(writer, &staged, label)?;
    if replaced && request.key_in_memory {
        let stale = self::key_path(request.out_dir, label);
        if let Err(e) = writer.remove(&stale) {
            tracing::warn!(path = %stale.display(), error = %format!("{e:#}"), "could not remove replaced key file");
        }
    }
    tracing::info!(
        label,
        workspace = %record.workspace_id,
        agents = record.agents.len(),
        replaced,
        "deployment committed"
    );

    Ok(DeployOutcome {
        record,
        bundle_path,
        key_path,
        issues: artifacts.issues,
        invalid_agents: artifacts.invalid_agents,
        embedded: packaged.embedded,
        stamped: packaged.stamped,
        replaced,
    })
}

/// Adds `record` to the `deployments` section, creating the workspace
/// section on first use, in one vault batch.
fn commit_record<B: VaultBackend>(
    vault: &mut Vault<B>,
    mut record: DeploymentRecord,
    now: DateTime<Utc>,
) -> Result<DeploymentRecord> {
    let mut batch = Vec::with_capacity(2);
    let workspace = match vault.workspace()? {
        Some(workspace) => {
            validate_workspace_id(&workspace.id)?;
            workspace
        }
        None => {
            let workspace = new_workspace(now);
            batch.push((
                SECTION_WORKSPACE.to_string(),
                serde_json::to_value(&workspace).context("failed to serialize workspace")?,
            ));
            workspace
        }
    };
    record.workspace_id = workspace.id;

    let mut deployments = vault.deployments_raw();
    deployments.insert(
        record.label.clone(),
        serde_json::to_value(&record).context("failed to serialize deployment record")?,
    );
    batch.push((SECTION_DEPLOYMENTS.to_string(), Value::Object(deployments)));

    if vault.batch(batch) {
        Ok(record)
    } else {
        Err(DeployError::VaultRejected(record.label).into())
    }
}

/// Moves staged artifacts over their final paths, in order.
fn promote(writer: &impl ArtifactWriter, staged: &[(PathBuf, PathBuf)], label: &str) -> Result<()> {
    for (index, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = writer.promote(tmp, path) {
            discard(writer, &staged[index..]);
            return Err(e).with_context(|| {
                format!("deployment '{label}' was committed but {} could not be put in place", path.display())
            });
        }
    }
    Ok(())
}

fn discard(writer: &impl ArtifactWriter, staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = writer.remove(tmp) {
            tracing::warn!(path = %tmp.display(), error = %format!("{e:#}"), "could not discard staged artifact");
        }
    }
}
