//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod council_pool;
pub mod debate;
pub mod dedup_executor;
pub mod error_policy;
pub mod fan_out;
pub mod run_council;
pub(crate) mod shared;
pub mod step_engine;
