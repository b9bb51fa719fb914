//! Worker port
//!
//! A worker is an opaque capability that turns a task into text. How it
//! produces that text (an LLM, a shell command, a human) is not the
//! engine's concern.

use async_trait::async_trait;
use council_domain::ExecutionError;

/// Port for workers
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Unique name within a council; proposals and votes refer to it
    fn name(&self) -> &str;

    /// Model backing the worker, if any
    fn model(&self) -> Option<&str> {
        None
    }

    /// Produce a response to `task`
    async fn work_on(&self, task: &str) -> Result<String, ExecutionError>;
}
