//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`; never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    ArtifactWriter, ConfigStore, FileHasher, InputLoader, ProgressReporter, SourceReader,
    VaultBackend,
};
pub use services::vault_commit::Vault;
