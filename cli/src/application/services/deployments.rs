//! Application service: inspecting and removing committed deployments.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use swarm_common::DeploymentRecord;

use crate::application::ports::{ArtifactWriter, FileHasher, VaultBackend};
use crate::application::services::deploy::{KEY_DIR, KEY_SUFFIX};
use crate::application::services::vault_commit::Vault;
use crate::domain::bundle::{open, sha256_hex};
use crate::domain::error::DeployError;
use crate::domain::vault::SECTION_DEPLOYMENTS;

/// State of a record's bundle file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    Intact,
    Modified,
    Unreadable,
}

/// # Errors
///
/// Returns an error if the record is missing or malformed.
pub fn find<B: VaultBackend>(vault: &Vault<B>, label: &str) -> Result<DeploymentRecord> {
    vault
        .deployment(label)?
        .ok_or_else(|| DeployError::NotFound(label.to_string()).into())
}

/// Compares the bundle on disk against the record's `encrypted_hash`.
pub fn bundle_state(record: &DeploymentRecord, hasher: &impl FileHasher) -> BundleState {
    let path = Path::new(&record.encrypted_path);
    match hasher.sha256_file(path) {
        Ok(hash) if hash == record.encrypted_hash => BundleState::Intact,
        Ok(_) => BundleState::Modified,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %format!("{e:#}"), "cannot hash bundle");
            BundleState::Unreadable
        }
    }
}

/// Key file written next to the bundle at deploy time.
#[must_use]
pub fn key_file_for(record: &DeploymentRecord) -> Option<PathBuf> {
    let parent = Path::new(&record.encrypted_path).parent()?;
    Some(parent.join(KEY_DIR).join(format!("{}{KEY_SUFFIX}", record.label)))
}

/// Drops the record from the vault, then deletes its artifacts.
///
/// # Errors
///
/// Returns an error if the label is unknown or the vault refuses the patch.
/// Artifact removal failures are logged, not returned.
pub fn remove<B: VaultBackend>(
    vault: &mut Vault<B>,
    label: &str,
    writer: &impl ArtifactWriter,
) -> Result<DeploymentRecord> {
    let record = find(vault, label)?;
    let mut deployments = vault.deployments_raw();
    deployments.remove(label);
    if !vault.patch(SECTION_DEPLOYMENTS, Value::Object(deployments)) {
        bail!("vault refused removal of deployment '{label}'");
    }

    let bundle = PathBuf::from(&record.encrypted_path);
    for path in std::iter::once(bundle).chain(key_file_for(&record)) {
        if let Err(e) = writer.remove(&path) {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "cannot remove artifact");
        }
    }
    tracing::info!(label, "deployment removed");
    Ok(record)
}

/// Opens a bundle with a bare swarm key.
///
/// # Errors
///
/// Returns an error if the bundle is malformed or the key does not open it.
pub fn decrypt_with_key(bundle_bytes: &[u8], swarm_key: &str) -> Result<Vec<u8>> {
    let bundle = serde_json::from_slice(bundle_bytes).context("not an encrypted bundle")?;
    Ok(open(&bundle, swarm_key.trim())?)
}

/// Opens a bundle with a vault record, verifying both recorded hashes.
///
/// # Errors
///
/// Returns an error if the bundle bytes or the opened plaintext do not match
/// the record.
pub fn decrypt_with_record(bundle_bytes: &[u8], record: &DeploymentRecord) -> Result<Vec<u8>> {
    let actual = sha256_hex(bundle_bytes);
    if actual != record.encrypted_hash {
        bail!(
            "bundle hash mismatch for '{}': recorded {}, found {actual}",
            record.label,
            record.encrypted_hash
        );
    }
    let plaintext = decrypt_with_key(bundle_bytes, &record.swarm_key)?;
    if !record.directive_hash.is_empty() && sha256_hex(&plaintext) != record.directive_hash {
        bail!("directive hash mismatch for '{}'", record.label);
    }
    Ok(plaintext)
}
