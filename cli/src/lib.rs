//! Swarm CLI library: exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod output;

use domain::{CompileError, ConfigError, DeployError, PackagingError, TreeError};

/// Stable machine-readable code for a command failure, used in JSON errors.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<CompileError>() {
        return match e {
            CompileError::Tree(_) => "INVALID_TREE",
            CompileError::ConstraintUnresolvable { .. } => "CONSTRAINT_UNRESOLVABLE",
            CompileError::RegistryValidationFailed { .. } => "REGISTRY_VALIDATION_FAILED",
            CompileError::CryptoGenerationFailure { .. } => "CRYPTO_GENERATION_FAILED",
        };
    }
    if err.downcast_ref::<TreeError>().is_some() {
        return "INVALID_TREE";
    }
    if err.downcast_ref::<PackagingError>().is_some() {
        return "PACKAGING_FAILED";
    }
    if let Some(e) = err.downcast_ref::<DeployError>() {
        return match e {
            DeployError::InvalidLabel(_) => "INVALID_LABEL",
            DeployError::AlreadyExists(_) => "ALREADY_EXISTS",
            DeployError::NotFound(_) => "NOT_FOUND",
            DeployError::VaultRejected(_) => "VAULT_REJECTED",
            DeployError::InvalidWorkspaceId(_) => "INVALID_WORKSPACE",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "INVALID_CONFIG";
    }
    "ERROR"
}
