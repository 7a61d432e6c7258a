// src/config/validate.rs

use crate::config::model::{FlowConfig, RawFlowConfig};
use crate::errors::{FlowError, Result};

/// Part ids shorter than this cannot hold a timestamp plus a counter.
pub const MIN_PART_ID_LEN: usize = 16;

impl TryFrom<RawFlowConfig> for FlowConfig {
    type Error = crate::errors::FlowError;

    fn try_from(raw: RawFlowConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(FlowConfig::new_unchecked(raw.scheduler, raw.memory, raw.events))
    }
}

fn validate_raw_config(cfg: &RawFlowConfig) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_memory(cfg)?;
    validate_events(cfg)?;
    Ok(())
}

fn validate_scheduler(cfg: &RawFlowConfig) -> Result<()> {
    // `mode` is strongly typed and validated during deserialization.
    if cfg.scheduler.max_workers == 0 {
        return Err(FlowError::ConfigError(
            "[scheduler].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_memory(cfg: &RawFlowConfig) -> Result<()> {
    if cfg.memory.separator.is_empty() {
        return Err(FlowError::ConfigError(
            "[memory].separator must not be empty".to_string(),
        ));
    }
    if cfg.memory.default_namespace.is_empty() {
        return Err(FlowError::ConfigError(
            "[memory].default_namespace must not be empty".to_string(),
        ));
    }
    if cfg.memory.default_namespace.contains(&cfg.memory.separator) {
        return Err(FlowError::ConfigError(format!(
            "[memory].default_namespace '{}' must not contain the separator '{}'",
            cfg.memory.default_namespace, cfg.memory.separator
        )));
    }
    Ok(())
}

fn validate_events(cfg: &RawFlowConfig) -> Result<()> {
    if cfg.events.message_id_prefix.is_empty() {
        return Err(FlowError::ConfigError(
            "[events].message_id_prefix must not be empty".to_string(),
        ));
    }
    if cfg.events.part_id_max_len < MIN_PART_ID_LEN {
        return Err(FlowError::ConfigError(format!(
            "[events].part_id_max_len must be >= {} (got {})",
            MIN_PART_ID_LEN, cfg.events.part_id_max_len
        )));
    }
    Ok(())
}
