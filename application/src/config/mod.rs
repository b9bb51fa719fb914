//! Application-level configuration.
//!
//! - [`ExecutionParams`] — concurrency bounds, timeouts and cache capacity

pub mod execution_params;

pub use execution_params::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_WORKERS, ExecutionParams};
