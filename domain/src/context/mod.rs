//! Execution context domain
//!
//! - [`StepResult`] — immutable outcome of one step
//! - [`ExecutionContext`] — append-only state shared by the steps of one run

pub mod execution_context;
pub mod step_result;

pub use execution_context::{DEFAULT_PROMPT_CONTEXT_LIMIT, ExecutionContext};
pub use step_result::StepResult;
