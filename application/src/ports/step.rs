//! Step port
//!
//! A step is one stage of a council run. The step engine drives its
//! lifecycle; the step itself only validates its configuration and does
//! its work against a read-only view of the execution context.

use async_trait::async_trait;
use council_domain::{ErrorStrategy, ExecutionContext, ExecutionError, StepResult};

#[async_trait]
pub trait Step: Send + Sync {
    /// Name used in events and logs
    fn name(&self) -> &str;

    /// Configuration problems; a non-empty list aborts the run before any work
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }

    /// Strategy applied when [`execute`](Self::execute) fails
    fn error_strategy(&self) -> ErrorStrategy {
        ErrorStrategy::Halt
    }

    /// Do the step's work. May be called several times under a retry strategy.
    async fn execute(
        &self,
        task: &str,
        context: &ExecutionContext,
    ) -> Result<StepResult, ExecutionError>;
}
