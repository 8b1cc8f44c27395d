//! Application service: the vault's single mutation choke point.
//!
//! `Vault` owns the in-memory [`VaultDocument`] and its backend. Every change
//! goes through [`Vault::patch`] or [`Vault::batch`]: the batch is validated
//! as a whole, persisted, and only then committed in memory and announced to
//! listeners. A refused or unpersisted batch leaves memory, snapshot and
//! backend exactly as they were.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use swarm_common::{DeploymentRecord, WorkspaceInfo};

use crate::application::ports::VaultBackend;
use crate::domain::vault::{SECTION_DEPLOYMENTS, SECTION_WORKSPACE, VaultDocument};

/// Called once per committed section with its new value.
pub type Listener = Box<dyn Fn(&str, &Value)>;

pub struct Vault<B: VaultBackend> {
    backend: B,
    document: VaultDocument,
    listeners: Vec<Listener>,
}

impl<B: VaultBackend> Vault<B> {
    /// Loads the vault from `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if stored bytes cannot be read or are not a JSON object.
    pub fn open(backend: B, min_bytes: usize) -> Result<Self> {
        let document = match backend.load()? {
            Some(bytes) => VaultDocument::from_bytes(&bytes, min_bytes)
                .with_context(|| format!("cannot parse vault at {}", backend.location()))?,
            None => VaultDocument::empty(min_bytes),
        };
        Ok(Self {
            backend,
            document,
            listeners: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, listener: impl Fn(&str, &Value) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.document.section(name)
    }

    /// Last known good serialized document.
    #[must_use]
    pub fn snapshot(&self) -> &[u8] {
        self.document.snapshot()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replaces one section. Returns `false` when refused.
    pub fn patch(&mut self, section: &str, value: Value) -> bool {
        self.batch(vec![(section.to_string(), value)])
    }

    /// Replaces several sections atomically. Returns `false` when any section
    /// is refused or the backend write fails; nothing is committed then.
    pub fn batch(&mut self, sections: Vec<(String, Value)>) -> bool {
        let staged = match self.document.stage(sections) {
            Ok(staged) => staged,
            Err(rejection) => {
                tracing::warn!(%rejection, "vault patch refused");
                return false;
            }
        };
        if let Err(error) = self.backend.save(staged.bytes()) {
            tracing::warn!(error = %format!("{error:#}"), location = %self.backend.location(), "vault write failed");
            return false;
        }
        tracing::debug!(sections = ?staged.section_names(), bytes = staged.bytes().len(), "vault committed");

        let names = match self.document.apply(staged) {
            Ok(names) => names,
            Err(rejection) => {
                tracing::error!(%rejection, location = %self.backend.location(), "staged vault batch went stale after it was persisted");
                return false;
            }
        };
        for name in names {
            if let Some(value) = self.document.section(&name) {
                for listener in &self.listeners {
                    listener(&name, value);
                }
            }
        }
        true
    }

    // ── Typed views ──────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns an error if the `workspace` section is malformed.
    pub fn workspace(&self) -> Result<Option<WorkspaceInfo>> {
        self.section(SECTION_WORKSPACE)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .context("malformed vault workspace section")
    }

    /// Raw `deployments` section, empty when absent.
    #[must_use]
    pub fn deployments_raw(&self) -> Map<String, Value> {
        self.section(SECTION_DEPLOYMENTS)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns an error if any record is malformed.
    pub fn deployments(&self) -> Result<BTreeMap<String, DeploymentRecord>> {
        self.deployments_raw()
            .into_iter()
            .map(|(label, value)| {
                serde_json::from_value(value)
                    .map(|record| (label.clone(), record))
                    .with_context(|| format!("malformed deployment record '{label}'"))
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns an error if the record exists but is malformed.
    pub fn deployment(&self, label: &str) -> Result<Option<DeploymentRecord>> {
        self.deployments_raw()
            .get(label)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .with_context(|| format!("malformed deployment record '{label}'"))
    }
}
