//! Path resolution for the config file and the store.

use std::path::PathBuf;

use crate::config::{default_config_path, read_config, HafalanConfig};
use crate::constants::CONFIG_ENV;

/// Resolve the config file path, checking HAFALAN_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Read the config file if there is one.
pub fn load_config() -> anyhow::Result<Option<HafalanConfig>> {
    let path = resolve_config_path()?;
    if !path.exists() {
        tracing::debug!(config = %path.display(), "no config file, using defaults");
        return Ok(None);
    }
    read_config(&path).map(Some)
}

/// Error message when the store has not been created.
pub fn missing_store_message(location: &str) -> String {
    format!("No student store found at {}", location)
}
