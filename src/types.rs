// src/types.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the scheduler overlaps the handlers of one wave.
///
/// Readiness, activation and halting behave the same in every mode; only
/// wall-clock overlap differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// Handlers run one at a time on the calling thread.
    Serial,
    /// Handlers of a wave run on a bounded worker pool.
    Threads,
    /// The wave is driven by a single-threaded Tokio runtime; handlers run on
    /// its blocking pool.
    Async,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Threads
    }
}

impl FromStr for ConcurrencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serial" => Ok(ConcurrencyMode::Serial),
            "threads" | "parallel" => Ok(ConcurrencyMode::Threads),
            "async" => Ok(ConcurrencyMode::Async),
            other => Err(format!(
                "invalid concurrency mode: {other} (expected \"serial\", \"threads\" or \"async\")"
            )),
        }
    }
}

/// Log verbosity accepted by [`crate::logging::init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}
