//! Domain error types

use std::time::Duration;
use thiserror::Error;

/// Failure raised while a step, worker or tool is doing its work.
///
/// This is the error class that the configured error strategy of a step
/// governs. Validation problems are reported separately and never take
/// this path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("{0}")]
    Failed(String),

    #[error("Worker {worker} failed: {message}")]
    Worker { worker: String, message: String },

    #[error("Worker {worker} timed out after {}ms", .limit.as_millis())]
    Timeout { worker: String, limit: Duration },

    #[error("No proposals were produced in round {0}")]
    NoProposals(usize),

    #[error("Task splitter produced {got} subtasks for {expected} workers")]
    SplitMismatch { expected: usize, got: usize },

    #[error("Operation cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Create a generic failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        ExecutionError::Failed(message.into())
    }

    /// Attribute a failure to a named worker
    pub fn worker(worker: impl Into<String>, message: impl Into<String>) -> Self {
        ExecutionError::Worker {
            worker: worker.into(),
            message: message.into(),
        }
    }

    /// A named worker did not answer within `limit`
    pub fn timeout(worker: impl Into<String>, limit: Duration) -> Self {
        ExecutionError::Timeout {
            worker: worker.into(),
            limit,
        }
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionError::Cancelled)
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::Timeout { .. })
    }
}
