//! Error policy execution
//!
//! Wraps a unit of step work with the step's [`ErrorStrategy`].
//!
//! ```text
//!            ┌──────── ok ────────▶ Succeeded
//! Running ───┤
//!            └─ err ─▶ Halt      ─▶ Failed(err)
//!                      Retry     ─▶ backoff ─▶ Running (until exhausted, then Halt)
//!                      Continue  ─▶ Skipped (empty failed result)
//!                      Fallback  ─▶ FellBack (configured result, marked failed)
//! ```

use crate::ports::event_sink::{CouncilEvent, EventSink, NoEvents, names};
use council_domain::{ErrorStrategy, ExecutionError, StepResult};
use serde_json::{Map, Value, json};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Applies an [`ErrorStrategy`] to a unit of work
pub struct ErrorPolicy {
    strategy: ErrorStrategy,
    events: Arc<dyn EventSink>,
}

impl ErrorPolicy {
    pub fn new(strategy: ErrorStrategy) -> Self {
        Self {
            strategy,
            events: Arc::new(NoEvents),
        }
    }

    /// Report `step_error` and `step_retry_success` to the given sink
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn strategy(&self) -> &ErrorStrategy {
        &self.strategy
    }

    /// Run `work` under the configured strategy.
    ///
    /// `work` is invoked once, plus once per retry. A cancellation error is
    /// returned as-is under every strategy.
    pub async fn execute_with_policy<F, Fut>(
        &self,
        step_name: &str,
        mut work: F,
    ) -> Result<StepResult, ExecutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<StepResult, ExecutionError>>,
    {
        let mut retries: u32 = 0;

        loop {
            let err = match work().await {
                Ok(result) => {
                    if retries > 0 {
                        info!("Step {} succeeded after {} retries", step_name, retries);
                        self.emit(
                            names::STEP_RETRY_SUCCESS,
                            json!({ "step": step_name, "attempts": retries + 1 }),
                        )
                        .await;
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            self.emit(
                names::STEP_ERROR,
                json!({
                    "step": step_name,
                    "error": err.to_string(),
                    "attempt": retries + 1,
                    "strategy": self.strategy.as_str(),
                }),
            )
            .await;

            if err.is_cancelled() {
                return Err(err);
            }

            match &self.strategy {
                ErrorStrategy::Halt => {
                    error!("Step {} failed: {}", step_name, err);
                    return Err(err);
                }
                ErrorStrategy::Retry {
                    max_attempts,
                    backoff,
                } => {
                    if retries >= *max_attempts {
                        error!(
                            "Step {} failed after {} retries: {}",
                            step_name, retries, err
                        );
                        return Err(err);
                    }
                    let delay = backoff.delay(retries);
                    warn!(
                        "Step {} failed (attempt {}), retrying in {:?}: {}",
                        step_name,
                        retries + 1,
                        delay,
                        err
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    retries += 1;
                }
                ErrorStrategy::Continue => {
                    warn!("Step {} failed, continuing: {}", step_name, err);
                    let mut metadata = Map::new();
                    metadata.insert("error".into(), Value::String(err.to_string()));
                    metadata.insert("skipped".into(), Value::Bool(true));
                    metadata.insert("step_name".into(), Value::String(step_name.to_string()));
                    return Ok(StepResult::new("", metadata, false));
                }
                ErrorStrategy::Fallback(fallback) => {
                    warn!("Step {} failed, using fallback: {}", step_name, err);
                    return Ok(fallback
                        .clone()
                        .into_failed()
                        .with_metadata("error", err.to_string()));
                }
            }
        }
    }

    async fn emit(&self, name: &'static str, payload: Value) {
        self.events.emit_async(CouncilEvent::new(name, payload)).await;
    }
}
