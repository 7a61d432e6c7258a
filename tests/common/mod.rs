#![allow(dead_code)]

use agentflow::ConcurrencyMode;

pub use agentflow_test_utils::{init_tracing, CollectingSink, GraphFixture};

/// Every concurrency mode; scheduling semantics must not depend on it.
pub const ALL_MODES: [ConcurrencyMode; 3] = [
    ConcurrencyMode::Serial,
    ConcurrencyMode::Threads,
    ConcurrencyMode::Async,
];
