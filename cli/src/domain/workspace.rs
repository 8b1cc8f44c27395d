//! Workspace identity stored in the vault `workspace` section.
//!
//! This module is intentionally free of I/O and external layer imports.

use chrono::{DateTime, Utc};
use swarm_common::WorkspaceInfo;

use crate::domain::error::DeployError;

pub const WORKSPACE_ID_PREFIX: &str = "swarm-";

/// Validates workspace ID format: `swarm-` followed by exactly 16 lowercase
/// hex characters.
///
/// # Errors
///
/// Returns [`DeployError::InvalidWorkspaceId`] if the ID doesn't match.
pub fn validate_workspace_id(id: &str) -> Result<(), DeployError> {
    let valid = id
        .strip_prefix(WORKSPACE_ID_PREFIX)
        .is_some_and(|hex| {
            hex.len() == 16 && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        });
    if valid {
        Ok(())
    } else {
        Err(DeployError::InvalidWorkspaceId(id.to_string()))
    }
}

/// Generate a unique workspace identifier.
#[must_use]
pub fn generate_workspace_id() -> String {
    format!("{WORKSPACE_ID_PREFIX}{:016x}", rand::random::<u64>())
}

#[must_use]
pub fn new_workspace(now: DateTime<Utc>) -> WorkspaceInfo {
    WorkspaceInfo {
        id: generate_workspace_id(),
        created_at: now,
    }
}
