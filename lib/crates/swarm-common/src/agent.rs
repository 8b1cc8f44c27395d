// lib/crates/swarm-common/src/agent.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::Registry;

/// Agent type (and fixed `universal_id`) of the single root node.
pub const ROOT_AGENT_NAME: &str = "matrix";

/// Tree input file (`tree.json` / `tree.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub nodes: Vec<AgentNode>,
}

/// A node in the deployment tree. Parent links are stored; children are
/// derived when the tree is snapshotted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNode {
    /// Internal stable key, never shown to operators.
    pub graph_id: String,
    /// Deployment-facing unique name.
    pub universal_id: String,
    /// Agent type.
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Free-form overrides. Older trees call this `params`.
    #[serde(default, alias = "params")]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDescriptor>,
    /// Server-issued stamp, attached after a successful deploy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(
        rename = "security-tag",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub security_tag: Option<String>,
}

impl AgentNode {
    /// Returns `true` for the tree root (`name == "matrix"`, no parent).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.name == ROOT_AGENT_NAME && self.parent.is_none()
    }
}

/// A declared capability requirement on an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    /// Capability category, e.g. `packet_signing`, `https`, `discord`.
    pub class: String,
    /// Constraint-specific settings (`proto`, `host`, `out`, ...).
    #[serde(default)]
    pub raw: Map<String, Value>,
    /// Registry serial of the assigned resource.
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub auto: bool,
    #[serde(default)]
    pub met: bool,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ConstraintDescriptor {
    /// Satisfied when auto-generated or when the serial resolves in `registry`.
    #[must_use]
    pub fn is_satisfied(&self, registry: &Registry) -> bool {
        if self.auto {
            return true;
        }
        self.serial
            .as_deref()
            .is_some_and(|serial| registry.get(&self.class, serial).is_some())
    }

    /// Reads a boolean setting from `raw`.
    #[must_use]
    pub fn raw_flag(&self, key: &str) -> Option<bool> {
        self.raw.get(key).and_then(Value::as_bool)
    }

    /// Reads a string setting from `raw`.
    #[must_use]
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }
}
