//! Council configuration from TOML (`[council]` section)

use council_application::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_WORKERS};
use serde::{Deserialize, Serialize};

/// Raw council configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Council name, reported in events and output
    pub name: String,
    /// Bound on concurrent worker and tool calls
    pub max_workers: usize,
    /// Per-call worker timeout in seconds
    pub worker_timeout_secs: Option<u64>,
    /// Per-invocation tool timeout in seconds
    pub tool_timeout_secs: Option<u64>,
    /// Cached tool results per executor
    pub cache_capacity: usize,
    /// Default error strategy for steps: halt | continue | retry | fallback
    pub on_error: String,
    /// Retries after the first failure (retry strategy)
    pub max_retries: u32,
    /// Base delay for exponential retry backoff
    pub retry_backoff_ms: u64,
    /// Output recorded by the fallback strategy
    pub fallback_output: String,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            name: "council".to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            worker_timeout_secs: None,
            tool_timeout_secs: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            on_error: "halt".to_string(),
            max_retries: 3,
            retry_backoff_ms: 1000,
            fallback_output: String::new(),
        }
    }
}
