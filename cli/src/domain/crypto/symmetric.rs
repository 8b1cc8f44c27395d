//! Symmetric payload keys.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{MintError, random_bytes, timestamp};

pub const SYMMETRIC_KEY_TYPE: &str = "aes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricKey {
    /// Base64 of 32 random bytes.
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
}

impl SymmetricKey {
    /// The agent needs the key itself to decrypt payloads.
    #[must_use]
    pub fn directive_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Map::new(),
        }
    }
}

/// One fresh AES-256 key per agent.
///
/// # Errors
///
/// Returns a [`MintError`] if the OS entropy source fails.
pub fn symmetric_encryption_factory(
    agents: &[String],
    now: DateTime<Utc>,
) -> Result<Vec<SymmetricKey>, MintError> {
    agents
        .iter()
        .enumerate()
        .map(|(index, agent)| {
            let bytes = random_bytes::<32>().map_err(|source| MintError {
                index,
                agent: agent.clone(),
                source,
            })?;
            Ok(SymmetricKey {
                key: STANDARD.encode(bytes),
                kind: SYMMETRIC_KEY_TYPE.to_string(),
                created_at: timestamp(now),
            })
        })
        .collect()
}
