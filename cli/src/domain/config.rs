//! Domain types and validators for swarm configuration.
//!
//! Pure functions only: no I/O, no filesystem access.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::crypto::{ALLOWED_KEY_BITS, CryptoSettings};
use crate::domain::error::ConfigError;
use crate::domain::vault::DEFAULT_MIN_VAULT_BYTES;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "vault.path",
    "vault.min_bytes",
    "crypto.ca_bits",
    "crypto.leaf_bits",
    "crypto.signing_bits",
    "crypto.validity_days",
    "deploy.dir",
    "deploy.source_template",
];

pub const DEFAULT_SOURCE_TEMPLATE: &str = "{name}/{name}.py";
pub const MAX_VALIDITY_DAYS: u32 = 36_500;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.swarm/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub vault: VaultConfig,
    pub crypto: CryptoSettings,
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault file. Defaults to `~/.swarm/vault.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub min_bytes: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: None,
            min_bytes: DEFAULT_MIN_VAULT_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Output directory for bundles. Defaults to `~/.swarm/deployments`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Source file location below the source root; `{name}` is the agent type.
    pub source_template: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            dir: None,
            source_template: DEFAULT_SOURCE_TEMPLATE.to_string(),
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: String| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid,
    };
    match key {
        "crypto.ca_bits" | "crypto.leaf_bits" | "crypto.signing_bits" => {
            let ok = value
                .parse::<usize>()
                .is_ok_and(|bits| ALLOWED_KEY_BITS.contains(&bits));
            if !ok {
                let valid: Vec<String> = ALLOWED_KEY_BITS.iter().map(ToString::to_string).collect();
                return Err(invalid(valid.join(", ")).into());
            }
        }
        "crypto.validity_days" => {
            if !value
                .parse::<u32>()
                .is_ok_and(|days| (1..=MAX_VALIDITY_DAYS).contains(&days))
            {
                return Err(invalid(format!("1..={MAX_VALIDITY_DAYS}")).into());
            }
        }
        "vault.min_bytes" => {
            if value.parse::<usize>().is_err() {
                return Err(invalid("a non-negative integer".to_string()).into());
            }
        }
        "deploy.source_template" => {
            if !value.contains("{name}") || value.contains("..") || value.starts_with('/') {
                return Err(invalid(
                    "a relative path containing {name}, without '..'".to_string(),
                )
                .into());
            }
        }
        "vault.path" | "deploy.dir" => {
            if value.trim().is_empty() {
                return Err(invalid("a non-empty path".to_string()).into());
            }
        }
        _ => {}
    }
    Ok(())
}

/// Validates `key`/`value` and writes the value into `config`.
///
/// # Errors
///
/// Returns an error if the key or value is invalid.
pub fn apply_config_value(config: &mut SwarmConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "vault.path" => config.vault.path = Some(PathBuf::from(value)),
        "vault.min_bytes" => config.vault.min_bytes = value.parse()?,
        "crypto.ca_bits" => config.crypto.ca_bits = value.parse()?,
        "crypto.leaf_bits" => config.crypto.leaf_bits = value.parse()?,
        "crypto.signing_bits" => config.crypto.signing_bits = value.parse()?,
        "crypto.validity_days" => config.crypto.validity_days = value.parse()?,
        "deploy.dir" => config.deploy.dir = Some(PathBuf::from(value)),
        "deploy.source_template" => config.deploy.source_template = value.to_string(),
        _ => {}
    }
    Ok(())
}

/// Current value of a whitelisted key as `config set` would accept it.
/// `None` for unset optional paths and unknown keys.
#[must_use]
pub fn config_value(config: &SwarmConfig, key: &str) -> Option<String> {
    match key {
        "vault.path" => config.vault.path.as_ref().map(|p| p.to_string_lossy().into_owned()),
        "vault.min_bytes" => Some(config.vault.min_bytes.to_string()),
        "crypto.ca_bits" => Some(config.crypto.ca_bits.to_string()),
        "crypto.leaf_bits" => Some(config.crypto.leaf_bits.to_string()),
        "crypto.signing_bits" => Some(config.crypto.signing_bits.to_string()),
        "crypto.validity_days" => Some(config.crypto.validity_days.to_string()),
        "deploy.dir" => config.deploy.dir.as_ref().map(|p| p.to_string_lossy().into_owned()),
        "deploy.source_template" => Some(config.deploy.source_template.clone()),
        _ => None,
    }
}

/// Runs every whitelisted key of a loaded config through
/// [`validate_config_value`], so a hand-edited file gets the same checks as
/// `config set`.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidValue`].
pub fn validate_config(config: &SwarmConfig) -> Result<()> {
    for key in VALID_CONFIG_KEYS {
        if let Some(value) = config_value(config, key) {
            validate_config_value(key, &value)?;
        }
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
