//! Dual compiler: one resolved tree, two artifacts.
//!
//! [`DeploymentCompiler`] emits the private tree plus the `certs` map.
//! [`DirectiveCompiler`] emits the public tree built only from each handler's
//! allow-listed fields. Both recurse over the same derived children lists, so
//! the two trees always have the same shape.

pub mod deployment;
pub mod directive;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use swarm_common::{AgentNode, Registry};

use crate::domain::constraint::{ConstraintIssue, resolve};
use crate::domain::crypto::CryptoSettings;
use crate::domain::error::CompileError;
use crate::domain::tree::AgentTree;

pub use deployment::{DeploymentArtifact, DeploymentCompiler};
pub use directive::{DirectiveArtifact, DirectiveCompiler};

/// One node of a compiled artifact tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledNode {
    pub universal_id: String,
    pub name: String,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(rename = "security-tag", default)]
    pub security_tag: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub connection: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<CompiledNode>,
    /// Base64 agent source, when embedded at packaging time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_embed: Option<String>,
    /// SHA-256 hex of the agent source, when stamped at packaging time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
}

impl CompiledNode {
    pub(crate) fn from_agent(
        agent: &AgentNode,
        config: Map<String, Value>,
        connection: Map<String, Value>,
        children: Vec<CompiledNode>,
    ) -> Self {
        Self {
            universal_id: agent.universal_id.clone(),
            name: agent.name.clone(),
            serial: agent.serial.clone(),
            security_tag: agent.security_tag.clone(),
            config,
            connection,
            children,
            source_embed: None,
            source_sha256: None,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Child counts in pre-order. Equal shapes mean equal topology.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::new();
        self.walk(&mut |node| shape.push(node.children.len()));
        shape
    }

    /// Visits every node in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Mutable pre-order visit, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `visit`.
    pub fn try_walk_mut<E>(
        &mut self,
        visit: &mut impl FnMut(&mut Self) -> Result<(), E>,
    ) -> Result<(), E> {
        visit(self)?;
        for child in &mut self.children {
            child.try_walk_mut(visit)?;
        }
        Ok(())
    }
}

/// Both artifacts of one compile, plus the non-blocking issues found.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub deployment: DeploymentArtifact,
    pub directive: DirectiveArtifact,
    pub issues: Vec<ConstraintIssue>,
    pub invalid_agents: Vec<String>,
}

/// Snapshots `nodes`, resolves every constraint and runs both compilers.
///
/// # Errors
///
/// Returns a [`CompileError`] if the tree is malformed or any blocking
/// constraint fails. Nothing is produced in that case.
pub fn compile(
    nodes: Vec<AgentNode>,
    registry: &Registry,
    settings: &CryptoSettings,
    now: DateTime<Utc>,
) -> Result<Artifacts, CompileError> {
    let tree = AgentTree::from_nodes(nodes)?;
    let resolved = resolve(tree, registry, settings, now)?;

    let deployment = DeploymentCompiler::new(&resolved).compile();
    let directive = DirectiveCompiler::new(&resolved).compile();
    tracing::info!(
        agents = deployment.tree.node_count(),
        certs = deployment.certs.len(),
        issues = resolved.issues.len(),
        "compiled agent tree"
    );

    Ok(Artifacts {
        deployment,
        directive,
        invalid_agents: resolved
            .invalid_agents()
            .into_iter()
            .map(str::to_string)
            .collect(),
        issues: resolved.issues,
    })
}

/// `universal_id → {connection_cert, signing, symmetric_encryption}`.
pub type CertsMap = BTreeMap<String, Map<String, Value>>;
