//! Packet signing keypairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CryptoSettings, MintError, generate_rsa, private_pem, public_pem, timestamp};
use crate::domain::error::CryptoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub agent: String,
    /// Sign outbound packets. Keys are only minted when set.
    pub out: bool,
}

/// Local and remote halves of a mutual-signing scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningBundle {
    pub pubkey: String,
    pub privkey: String,
    pub remote_pubkey: String,
    pub remote_privkey: String,
    pub created_at: String,
}

impl SigningBundle {
    /// Public keys and the timestamp. Private halves stay in the vault.
    #[must_use]
    pub fn directive_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("pubkey".to_string(), Value::String(self.pubkey.clone()));
        fields.insert(
            "remote_pubkey".to_string(),
            Value::String(self.remote_pubkey.clone()),
        );
        fields.insert(
            "created_at".to_string(),
            Value::String(self.created_at.clone()),
        );
        fields
    }
}

/// Mints two independent keypairs for every request with `out` set.
///
/// # Errors
///
/// Returns the first [`MintError`].
pub fn signing_cert_factory(
    requests: &[SigningRequest],
    settings: &CryptoSettings,
    now: DateTime<Utc>,
) -> Result<Vec<Option<SigningBundle>>, MintError> {
    requests
        .iter()
        .enumerate()
        .map(|(index, request)| {
            if !request.out {
                return Ok(None);
            }
            tracing::debug!(agent = %request.agent, "minting signing keypairs");
            mint(settings.signing_bits, now)
                .map(Some)
                .map_err(|source| MintError {
                    index,
                    agent: request.agent.clone(),
                    source,
                })
        })
        .collect()
}

fn mint(bits: usize, now: DateTime<Utc>) -> Result<SigningBundle, CryptoError> {
    let local = generate_rsa(bits)?;
    let remote = generate_rsa(bits)?;
    Ok(SigningBundle {
        pubkey: public_pem(&local)?,
        privkey: private_pem(&local)?,
        remote_pubkey: public_pem(&remote)?,
        remote_privkey: private_pem(&remote)?,
        created_at: timestamp(now),
    })
}
