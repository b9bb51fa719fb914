//! Execution parameters: dispatch and caching control.
//!
//! [`ExecutionParams`] groups the static parameters that bound concurrent
//! work in the debate and fan-out steps and in the
//! [`DeduplicatingExecutor`](crate::use_cases::dedup_executor::DeduplicatingExecutor).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound on concurrently running worker or tool calls
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Default number of cached tool results per executor
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Concurrency, timeout and cache parameters.
///
/// | Parameter | Used by |
/// |-----------|---------|
/// | `max_workers` | debate, fan-out, executor |
/// | `worker_timeout` | debate, fan-out |
/// | `tool_timeout` | executor |
/// | `cache_capacity` | executor |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Maximum number of worker/tool calls in flight at once
    pub max_workers: usize,
    /// Timeout applied to each worker call
    pub worker_timeout: Option<Duration>,
    /// Timeout applied to each tool invocation
    pub tool_timeout: Option<Duration>,
    /// Maximum number of cached tool results
    pub cache_capacity: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            worker_timeout: None,
            tool_timeout: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    /// Set the concurrency bound (a value of 0 is treated as 1)
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    pub fn with_worker_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.worker_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_workers, 10);
        assert_eq!(params.cache_capacity, 1024);
        assert!(params.worker_timeout.is_none());
        assert!(params.tool_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_workers(0)
            .with_worker_timeout(Some(Duration::from_secs(5)))
            .with_cache_capacity(8);

        assert_eq!(params.max_workers, 1);
        assert_eq!(params.worker_timeout, Some(Duration::from_secs(5)));
        assert_eq!(params.cache_capacity, 8);
    }
}
