// lib/crates/swarm-common/src/record.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// On-disk form of an encrypted directive (`<label>.enc.json`).
/// All three fields are standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBundle {
    pub nonce: String,
    pub tag: String,
    pub ciphertext: String,
}

/// One agent of a committed deployment, flattened out of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedAgent {
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
}

/// Vault record stored under `deployments.<label>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub label: String,
    pub workspace_id: String,
    pub deployed_at: DateTime<Utc>,
    /// Base64 of the 32-byte AES-256 key that sealed the directive.
    pub swarm_key: String,
    pub encrypted_path: String,
    /// SHA-256 hex of the encrypted bundle file bytes.
    pub encrypted_hash: String,
    /// SHA-256 hex of the directive plaintext.
    #[serde(default)]
    pub directive_hash: String,
    pub agents: Vec<DeployedAgent>,
    /// `universal_id → {connection_cert, signing, symmetric_encryption}`.
    #[serde(default)]
    pub certs: BTreeMap<String, Map<String, Value>>,
}

/// Vault `workspace` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
}
