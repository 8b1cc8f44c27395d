//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `swarm_common`; never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use swarm_common::{Registry, TreeDocument};

use crate::domain::SwarmConfig;

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading and saving `SwarmConfig`.
pub trait ConfigStore {
    /// Load configuration, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<SwarmConfig>;
    /// Persist configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &SwarmConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Input Ports ───────────────────────────────────────────────────────────────

/// Loads the operator's tree and registry snapshots.
pub trait InputLoader {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load_tree(&self, path: &Path) -> Result<TreeDocument>;
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load_registry(&self, path: &Path) -> Result<Registry>;
}

/// Reads agent source files for embedding and hash stamping.
pub trait SourceReader {
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns any other I/O error.
    fn read_source(&self, path: &Path) -> std::io::Result<Option<Vec<u8>>>;
}

// ── Artifact Ports ────────────────────────────────────────────────────────────

/// Writes and removes deployment artifacts.
///
/// Artifacts are staged beside their final path and promoted over it only
/// after the deployment record is committed. Whatever sits at the final path
/// is untouched until then.
pub trait ArtifactWriter {
    /// Stage the encrypted bundle beside `path`, creating parent directories.
    /// Returns the staged path. A failed write leaves no file behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged file cannot be written.
    fn stage_bundle(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf>;
    /// Stage a swarm key file with owner-only permissions beside `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged file cannot be written.
    fn stage_key(&self, path: &Path, key: &str) -> Result<PathBuf>;
    /// Atomically replace `path` with a staged artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails; `path` is unchanged then.
    fn promote(&self, staged: &Path, path: &Path) -> Result<()>;
    /// Remove a previously written artifact. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn remove(&self, path: &Path) -> Result<()>;
}

/// Abstracts file hashing operations.
pub trait FileHasher {
    /// Compute the SHA-256 hex digest of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}

// ── Vault Port ────────────────────────────────────────────────────────────────

/// Durable storage for the serialized vault document.
pub trait VaultBackend {
    /// Returns `Ok(None)` when no vault has been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if stored bytes exist but cannot be read.
    fn load(&self) -> Result<Option<Vec<u8>>>;
    /// Replace the stored document atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous document must remain.
    fn save(&self, bytes: &[u8]) -> Result<()>;
    /// Human-readable location, for messages.
    fn location(&self) -> String;
}
