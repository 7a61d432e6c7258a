// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{FlowConfig, RawFlowConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawFlowConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFlowConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawFlowConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks worker counts, separators and id settings.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FlowConfig> {
    let raw_config = load_from_path(&path)?;
    let config = FlowConfig::try_from(raw_config)?;
    Ok(config)
}

/// Same as [`load_and_validate`] for configuration held in memory.
pub fn parse_and_validate(contents: &str) -> Result<FlowConfig> {
    let raw: RawFlowConfig = toml::from_str(contents)?;
    FlowConfig::try_from(raw)
}
