//! Error strategies for step execution
//!
//! A step's strategy decides what happens when its work fails:
//!
//! | Strategy | On failure |
//! |----------|-----------|
//! | `Halt` | error is returned, the run aborts |
//! | `Retry` | retried with backoff, then behaves like `Halt` |
//! | `Continue` | empty `success = false` result, the run goes on |
//! | `Fallback` | configured result marked `success = false`, the run goes on |

use crate::context::StepResult;
use std::time::Duration;

/// Delay schedule between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same delay before every retry
    Fixed(Duration),
    /// `base * 2^attempt`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => *d,
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.min(31));
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

/// How a step reacts to an [`ExecutionError`](crate::ExecutionError)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ErrorStrategy {
    /// Fail the step and abort the run
    #[default]
    Halt,
    /// Retry up to `max_attempts` additional times after the first failure
    Retry { max_attempts: u32, backoff: Backoff },
    /// Record an empty failed result and keep going
    Continue,
    /// Record the given result (marked as failed) and keep going
    Fallback(StepResult),
}

impl ErrorStrategy {
    /// Retry strategy with the default exponential backoff
    pub fn retry(max_attempts: u32) -> Self {
        ErrorStrategy::Retry {
            max_attempts,
            backoff: Backoff::default(),
        }
    }

    /// Short name used in logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStrategy::Halt => "halt",
            ErrorStrategy::Retry { .. } => "retry",
            ErrorStrategy::Continue => "continue",
            ErrorStrategy::Fallback(_) => "fallback",
        }
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, ErrorStrategy::Halt)
    }

    /// Whether a failure under this strategy still lets the run continue
    pub fn tolerates_failure(&self) -> bool {
        matches!(self, ErrorStrategy::Continue | ErrorStrategy::Fallback(_))
    }
}

impl std::fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorStrategy::Retry { max_attempts, .. } => {
                write!(f, "retry (up to {} attempts)", max_attempts)
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}
