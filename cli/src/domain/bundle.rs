//! AES-256-GCM sealing of the directive plaintext.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use swarm_common::EncryptedBundle;

use crate::domain::crypto::random_bytes;
use crate::domain::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// A sealed directive and everything needed to open and verify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedDirective {
    pub bundle: EncryptedBundle,
    /// Base64 of the 32-byte key.
    pub swarm_key: String,
    /// SHA-256 hex of the plaintext.
    pub directive_hash: String,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Seals `plaintext` under a fresh random key.
///
/// # Errors
///
/// Returns a [`CryptoError`] if entropy is unavailable or encryption fails.
pub fn seal(plaintext: &[u8]) -> Result<SealedDirective, CryptoError> {
    let key = random_bytes::<KEY_LEN>()?;
    seal_with_key(plaintext, &key)
}

/// Seals `plaintext` under `key` with a fresh 96-bit nonce.
///
/// # Errors
///
/// Returns a [`CryptoError`] if entropy is unavailable or encryption fails.
pub fn seal_with_key(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<SealedDirective, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::Encrypt)?;
    let nonce = random_bytes::<NONCE_LEN>()?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| CryptoError::Encrypt)?;

    Ok(SealedDirective {
        bundle: EncryptedBundle {
            nonce: STANDARD.encode(nonce),
            tag: STANDARD.encode(tag),
            ciphertext: STANDARD.encode(&buffer),
        },
        swarm_key: STANDARD.encode(key),
        directive_hash: sha256_hex(plaintext),
    })
}

/// Opens `bundle` with the base64 `swarm_key`.
///
/// # Errors
///
/// Returns [`CryptoError::Malformed`] for bad base64 or wrong lengths and
/// [`CryptoError::Decrypt`] when authentication fails.
pub fn open(bundle: &EncryptedBundle, swarm_key: &str) -> Result<Vec<u8>, CryptoError> {
    let key = decode("swarm key", swarm_key.trim(), KEY_LEN)?;
    let nonce = decode("nonce", &bundle.nonce, NONCE_LEN)?;
    let tag = decode("tag", &bundle.tag, TAG_LEN)?;
    let mut buffer = STANDARD
        .decode(&bundle.ciphertext)
        .map_err(|e| malformed("ciphertext", &e))?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Decrypt)?;
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&nonce),
            b"",
            &mut buffer,
            Tag::from_slice(&tag),
        )
        .map_err(|_| CryptoError::Decrypt)?;
    Ok(buffer)
}

fn decode(field: &'static str, value: &str, len: usize) -> Result<Vec<u8>, CryptoError> {
    let bytes = STANDARD.decode(value).map_err(|e| malformed(field, &e))?;
    if bytes.len() != len {
        return Err(CryptoError::Malformed {
            field,
            reason: format!("expected {len} bytes, got {}", bytes.len()),
        });
    }
    Ok(bytes)
}

fn malformed(field: &'static str, e: &base64::DecodeError) -> CryptoError {
    CryptoError::Malformed {
        field,
        reason: e.to_string(),
    }
}
