// src/config/model.rs

use serde::Deserialize;

use crate::types::ConcurrencyMode;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [scheduler]
/// mode = "threads"
/// max_workers = 8
///
/// [memory]
/// separator = ":"
/// default_namespace = "default"
///
/// [events]
/// message_id_prefix = "msg"
/// part_id_max_len = 32
/// ```
///
/// All sections are optional and have reasonable defaults.
///
/// This is the unvalidated form; use [`FlowConfig::try_from`] (or
/// [`crate::config::load_and_validate`]) to obtain a [`FlowConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFlowConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub events: EventConfig,
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct FlowConfig {
    pub scheduler: SchedulerConfig,
    pub memory: MemoryConfig,
    pub events: EventConfig,
}

impl FlowConfig {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerConfig,
        memory: MemoryConfig,
        events: EventConfig,
    ) -> Self {
        Self {
            scheduler,
            memory,
            events,
        }
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// `"serial"`, `"threads"` (default) or `"async"`.
    #[serde(default)]
    pub mode: ConcurrencyMode,

    /// Upper bound on handlers running at once in `threads` mode.
    ///
    /// Handlers that block on shared memory occupy a worker while they wait,
    /// so a wave whose members wait on each other needs at least that many
    /// workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_workers() -> usize {
    4
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: ConcurrencyMode::default(),
            max_workers: default_max_workers(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_mode(mode: ConcurrencyMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// `[memory]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Separator placed between a namespace and a key, e.g. `shared:status`.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Namespace reported for keys written outside any scope.
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
}

fn default_separator() -> String {
    ":".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            default_namespace: default_namespace(),
        }
    }
}

/// `[events]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    /// Prefix of generated message identifiers (`msg_...`).
    #[serde(default = "default_message_id_prefix")]
    pub message_id_prefix: String,

    /// Maximum length of generated part identifiers.
    ///
    /// Some downstream consumers reject long identifiers, so part ids are
    /// capped.
    #[serde(default = "default_part_id_max_len")]
    pub part_id_max_len: usize,
}

fn default_message_id_prefix() -> String {
    "msg".to_string()
}

fn default_part_id_max_len() -> usize {
    32
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            message_id_prefix: default_message_id_prefix(),
            part_id_max_len: default_part_id_max_len(),
        }
    }
}
