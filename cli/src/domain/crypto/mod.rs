//! Crypto material factory.
//!
//! Stateless, synchronous generators for TLS certificate chains, packet
//! signing keypairs and symmetric keys. Every call draws fresh entropy from
//! the OS; nothing is cached or reused between compiles.

pub mod connection_cert;
pub mod signing;
pub mod symmetric;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::domain::error::CryptoError;

pub use connection_cert::{
    CaRoot, ConnectionCertBundle, ConnectionRequest, IssuedCert, connection_cert_factory,
    spki_pin,
};
pub use signing::{SigningBundle, SigningRequest, signing_cert_factory};
pub use symmetric::{SymmetricKey, symmetric_encryption_factory};

/// RSA modulus sizes accepted for any generated key.
pub const ALLOWED_KEY_BITS: &[usize] = &[2048, 3072, 4096];

/// Key sizes and certificate lifetime used by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoSettings {
    pub ca_bits: usize,
    pub leaf_bits: usize,
    pub signing_bits: usize,
    pub validity_days: u32,
}

impl Default for CryptoSettings {
    fn default() -> Self {
        Self {
            ca_bits: 4096,
            leaf_bits: 2048,
            signing_bits: 2048,
            validity_days: 3650,
        }
    }
}

/// A factory failure tied to the request that caused it.
#[derive(Debug)]
pub struct MintError {
    /// Position of the failing request in the batch.
    pub index: usize,
    pub agent: String,
    pub source: CryptoError,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

pub(crate) fn generate_rsa(bits: usize) -> Result<RsaPrivateKey, CryptoError> {
    if !ALLOWED_KEY_BITS.contains(&bits) {
        return Err(CryptoError::Malformed {
            field: "key size",
            reason: format!("{bits} bits is not one of {ALLOWED_KEY_BITS:?}"),
        });
    }
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| CryptoError::KeyGeneration(e.to_string()))
}

/// PKCS#8 PEM of a private key.
pub(crate) fn private_pem(key: &RsaPrivateKey) -> Result<String, CryptoError> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// SubjectPublicKeyInfo PEM of a key's public half.
pub(crate) fn public_pem(key: &RsaPrivateKey) -> Result<String, CryptoError> {
    RsaPublicKey::from(key)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Entropy(e.to_string()))?;
    Ok(bytes)
}

/// ISO-8601 UTC with second precision, e.g. `2026-01-02T03:04:05Z`.
pub(crate) fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}
