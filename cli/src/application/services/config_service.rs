//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::{EnvOverrides, VcprovConfig};

/// Load configuration from the store and overlay environment values.
///
/// # Errors
///
/// Returns an error if the stored configuration cannot be read.
pub fn load_config(store: &impl ConfigStore, env: &EnvOverrides) -> Result<VcprovConfig> {
    Ok(env.apply(store.load()?))
}

/// Validate and persist one `key = value` pair. Environment values are never
/// written back.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the store fails.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<VcprovConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}
