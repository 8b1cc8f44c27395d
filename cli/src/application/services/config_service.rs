//! Application service: configuration use-cases.

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::{SwarmConfig, apply_config_value, validate_config};

/// Load configuration, falling back to defaults when no file exists.
/// Every setting is checked as if it had been given to `config set`.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or holds
/// a value `config set` would refuse.
pub fn load_config(store: &impl ConfigStore) -> Result<SwarmConfig> {
    let config = store.load()?;
    validate_config(&config).context("invalid configuration file; fix it with `swarm config set`")?;
    Ok(config)
}

/// Validate and persist one setting, returning the updated configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the store fails.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<SwarmConfig> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::debug!(key, value, "configuration updated");
    Ok(config)
}
