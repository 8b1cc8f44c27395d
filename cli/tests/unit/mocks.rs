//! Shared in-memory port implementations for unit tests.

#![allow(clippy::expect_used, dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::{Value, json};
use swarm_cli::application::ports::{
    ArtifactWriter, FileHasher, ProgressReporter, SourceReader, VaultBackend,
};
use swarm_cli::domain::bundle::sha256_hex;
use swarm_cli::domain::crypto::CryptoSettings;
use swarm_common::{Registry, RegistryObject, TreeDocument};

// ── Vault backend ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemVault {
    pub stored: RefCell<Option<Vec<u8>>>,
    pub fail_writes: Cell<bool>,
    pub writes: Cell<usize>,
}

impl MemVault {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let vault = Self::default();
        *vault.stored.borrow_mut() = Some(bytes.to_vec());
        vault
    }

    pub fn stored_json(&self) -> Option<Value> {
        self.stored
            .borrow()
            .as_ref()
            .map(|b| serde_json::from_slice(b).expect("stored vault is JSON"))
    }
}

impl VaultBackend for MemVault {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.get() {
            anyhow::bail!("disk full");
        }
        self.writes.set(self.writes.get() + 1);
        *self.stored.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// ── Filesystem ports ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemFs {
    pub files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    pub sources: BTreeMap<PathBuf, Vec<u8>>,
    pub fail_key_write: bool,
    pub fail_bundle_write: bool,
}

impl MemFs {
    pub fn with_source(mut self, path: impl Into<PathBuf>, body: &[u8]) -> Self {
        self.sources.insert(path.into(), body.to_vec());
        self
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

impl SourceReader for MemFs {
    fn read_source(&self, path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        Ok(self.sources.get(path).cloned())
    }
}

impl ArtifactWriter for MemFs {
    fn stage_bundle(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        if self.fail_bundle_write {
            anyhow::bail!("no space left on device");
        }
        let staged = staged_path(path);
        self.files.borrow_mut().insert(staged.clone(), bytes.to_vec());
        Ok(staged)
    }

    fn stage_key(&self, path: &Path, key: &str) -> Result<PathBuf> {
        if self.fail_key_write {
            anyhow::bail!("permission denied");
        }
        let staged = staged_path(path);
        self.files
            .borrow_mut()
            .insert(staged.clone(), format!("{key}\n").into_bytes());
        Ok(staged)
    }

    fn promote(&self, staged: &Path, path: &Path) -> Result<()> {
        let mut files = self.files.borrow_mut();
        let bytes = files
            .remove(staged)
            .ok_or_else(|| anyhow::anyhow!("nothing staged at {}", staged.display()))?;
        files.insert(path.to_path_buf(), bytes);
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }
}

impl FileHasher for MemFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        self.file(path)
            .map(|b| sha256_hex(&b))
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(format!("warn: {message}"));
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub fn fast_crypto() -> CryptoSettings {
    CryptoSettings {
        ca_bits: 2048,
        ..CryptoSettings::default()
    }
}

/// matrix → sentinel (signing + symmetric) and oracle (openai via registry).
pub fn sample_tree() -> TreeDocument {
    serde_json::from_value(json!({
        "nodes": [
            {"graph_id": "g0", "universal_id": "matrix", "name": "matrix", "parent": null},
            {
                "graph_id": "g1", "universal_id": "log-sentinel", "name": "log_sentinel",
                "parent": "g0",
                "constraints": [
                    {"class": "packet_signing", "auto": true, "raw": {"out": true}},
                    {"class": "symmetric_encryption", "auto": true}
                ]
            },
            {
                "graph_id": "g2", "universal_id": "oracle", "name": "oracle", "parent": "g0",
                "params": {"poll": 5},
                "constraints": [{"class": "openai", "serial": "o-1"}]
            }
        ]
    }))
    .expect("valid tree")
}

pub fn sample_registry() -> Registry {
    let mut registry = Registry::default();
    registry.insert(
        "openai",
        "o-1",
        RegistryObject::with_fields(
            json!({"api_key": "sk-test", "model": "gpt", "billing_owner": "ops"})
                .as_object()
                .cloned()
                .expect("object"),
        ),
    );
    registry
}
