//! Fan-out domain
//!
//! Task splitting and the default combination of parallel outputs.

mod combine;
mod splitter;

pub use combine::concatenate_outputs;
pub use splitter::{DEFAULT_DOMAINS, SplitFn, Subtask, TaskSplitter};
