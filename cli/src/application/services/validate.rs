//! Application service: preflight validation of a tree without minting.

use anyhow::Result;
use swarm_common::{Registry, TreeDocument};

use crate::domain::constraint::{Preflight, preflight};
use crate::domain::tree::AgentTree;

/// Snapshots the tree and dry-runs constraint resolution against `registry`.
///
/// # Errors
///
/// Returns the first structural or blocking constraint error.
pub fn validate_tree(tree: TreeDocument, registry: &Registry) -> Result<Preflight> {
    let tree = AgentTree::from_nodes(tree.nodes)?;
    let summary = preflight(&tree, registry)?;
    tracing::info!(
        agents = summary.agents,
        constraints = summary.constraints,
        issues = summary.issues.len(),
        "preflight complete"
    );
    Ok(summary)
}
