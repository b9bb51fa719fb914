//! Step engine
//!
//! Drives the lifecycle of one step:
//!
//! ```text
//! validate ──(errors)──▶ Err(Validation)
//!    │
//!    ▼
//! emit step_start ─▶ execute under ErrorPolicy ─┬─ ok  ─▶ emit step_complete ─▶ append result
//!                                               └─ err ─▶ emit step_failed ───▶ Err(Execution)
//! ```

use crate::ports::event_sink::{CouncilEvent, EventSink, NoEvents, names};
use crate::ports::step::Step;
use crate::use_cases::error_policy::ErrorPolicy;
use council_domain::core::string::take_chars;
use council_domain::{ExecutionContext, ExecutionError, StepResult};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Characters of the task included in `step_start`
const TASK_PREVIEW_CHARS: usize = 100;

/// Characters of the output included in `step_complete`
const OUTPUT_PREVIEW_CHARS: usize = 200;

/// Errors that end a step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepEngineError {
    #[error("Step {step} is misconfigured: {}", .errors.join("; "))]
    Validation { step: String, errors: Vec<String> },

    #[error("Step {step} failed: {source}")]
    Execution {
        step: String,
        #[source]
        source: ExecutionError,
    },
}

impl StepEngineError {
    pub fn step(&self) -> &str {
        match self {
            StepEngineError::Validation { step, .. } | StepEngineError::Execution { step, .. } => {
                step
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StepEngineError::Execution { source, .. } if source.is_cancelled())
    }
}

/// Runs steps against an execution context
pub struct StepEngine {
    events: Arc<dyn EventSink>,
}

impl Default for StepEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StepEngine {
    pub fn new() -> Self {
        Self {
            events: Arc::new(NoEvents),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.events)
    }

    /// Execute one step and append its result to `context`.
    ///
    /// The engine is the only writer of step results; the step itself only
    /// sees a shared borrow of the context.
    pub async fn execute_step(
        &self,
        step: &dyn Step,
        task: &str,
        context: &mut ExecutionContext,
    ) -> Result<StepResult, StepEngineError> {
        let step_name = step.name().to_string();

        let errors = step.validate();
        if !errors.is_empty() {
            debug!("Step {} rejected by validation: {:?}", step_name, errors);
            return Err(StepEngineError::Validation {
                step: step_name,
                errors,
            });
        }

        info!("Starting step {}", step_name);
        self.emit(
            names::STEP_START,
            json!({ "step": step_name, "task": take_chars(task, TASK_PREVIEW_CHARS) }),
        )
        .await;

        let policy = ErrorPolicy::new(step.error_strategy()).with_events(self.events());
        let outcome = {
            let view: &ExecutionContext = context;
            policy
                .execute_with_policy(&step_name, || step.execute(task, view))
                .await
        };

        match outcome {
            Ok(result) => {
                info!(
                    "Step {} completed (success: {})",
                    step_name,
                    result.success()
                );
                self.emit(
                    names::STEP_COMPLETE,
                    json!({
                        "step": step_name,
                        "result": {
                            "output": take_chars(result.output(), OUTPUT_PREVIEW_CHARS),
                            "success": result.success(),
                            "metadata": result.metadata(),
                        },
                    }),
                )
                .await;
                context.add_result(result.clone());
                Ok(result)
            }
            Err(source) => {
                self.emit(
                    names::STEP_FAILED,
                    json!({ "step": step_name, "error": source.to_string() }),
                )
                .await;
                Err(StepEngineError::Execution {
                    step: step_name,
                    source,
                })
            }
        }
    }

    async fn emit(&self, name: &'static str, payload: Value) {
        self.events.emit_async(CouncilEvent::new(name, payload)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_sink::RecordingSink;
    use async_trait::async_trait;
    use council_domain::{Backoff, ErrorStrategy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestStep {
        name: String,
        errors: Vec<String>,
        strategy: ErrorStrategy,
        failures: usize,
        calls: AtomicUsize,
    }

    impl TestStep {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                errors: Vec::new(),
                strategy: ErrorStrategy::Halt,
                failures: 0,
                calls: AtomicUsize::new(0),
            }
        }

        fn invalid(mut self, error: &str) -> Self {
            self.errors.push(error.to_string());
            self
        }

        fn failing(mut self, failures: usize, strategy: ErrorStrategy) -> Self {
            self.failures = failures;
            self.strategy = strategy;
            self
        }
    }

    #[async_trait]
    impl Step for TestStep {
        fn name(&self) -> &str {
            &self.name
        }

        fn validate(&self) -> Vec<String> {
            self.errors.clone()
        }

        fn error_strategy(&self) -> ErrorStrategy {
            self.strategy.clone()
        }

        async fn execute(
            &self,
            task: &str,
            context: &ExecutionContext,
        ) -> Result<StepResult, ExecutionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(ExecutionError::failed("not yet"));
            }
            Ok(StepResult::ok(format!(
                "{} after {} results",
                task,
                context.len()
            )))
        }
    }

    #[tokio::test]
    async fn test_success_appends_result_and_emits_events() {
        let sink = Arc::new(RecordingSink::default());
        let engine = StepEngine::new().with_events(sink.clone());
        let mut context = ExecutionContext::new();

        let result = engine
            .execute_step(&TestStep::new("first"), "task", &mut context)
            .await
            .unwrap();

        assert_eq!(result.output(), "task after 0 results");
        assert_eq!(context.get_results(), vec![result]);
        assert_eq!(sink.names(), vec!["step_start", "step_complete"]);
        assert_eq!(sink.events()[1].payload["result"]["success"], true);
    }

    #[tokio::test]
    async fn test_steps_see_previous_results() {
        let engine = StepEngine::new();
        let mut context = ExecutionContext::new();

        engine
            .execute_step(&TestStep::new("a"), "x", &mut context)
            .await
            .unwrap();
        let second = engine
            .execute_step(&TestStep::new("b"), "y", &mut context)
            .await
            .unwrap();

        assert_eq!(second.output(), "y after 1 results");
    }

    #[tokio::test]
    async fn test_validation_short_circuits() {
        let sink = Arc::new(RecordingSink::default());
        let engine = StepEngine::new().with_events(sink.clone());
        let mut context = ExecutionContext::new();
        let step = TestStep::new("bad").invalid("needs two workers");

        let err = engine
            .execute_step(&step, "task", &mut context)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StepEngineError::Validation {
                step: "bad".into(),
                errors: vec!["needs two workers".into()],
            }
        );
        assert_eq!(step.calls.load(Ordering::SeqCst), 0);
        assert!(sink.events().is_empty());
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_failure_emits_step_failed() {
        let sink = Arc::new(RecordingSink::default());
        let engine = StepEngine::new().with_events(sink.clone());
        let mut context = ExecutionContext::new();
        let step = TestStep::new("broken").failing(1, ErrorStrategy::Halt);

        let err = engine
            .execute_step(&step, "task", &mut context)
            .await
            .unwrap_err();

        assert_eq!(err.step(), "broken");
        assert_eq!(err.to_string(), "Step broken failed: not yet");
        assert_eq!(sink.names(), vec!["step_start", "step_error", "step_failed"]);
        assert_eq!(context.len(), 0);
    }

    #[tokio::test]
    async fn test_continue_records_failed_result() {
        let engine = StepEngine::new();
        let mut context = ExecutionContext::new();
        let step = TestStep::new("soft").failing(1, ErrorStrategy::Continue);

        let result = engine
            .execute_step(&step, "task", &mut context)
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(context.get_results()[0].metadata()["skipped"], true);
    }

    #[tokio::test]
    async fn test_retry_reexecutes_step() {
        let sink = Arc::new(RecordingSink::default());
        let engine = StepEngine::new().with_events(sink.clone());
        let mut context = ExecutionContext::new();
        let step = TestStep::new("flaky").failing(
            2,
            ErrorStrategy::Retry {
                max_attempts: 2,
                backoff: Backoff::None,
            },
        );

        let result = engine
            .execute_step(&step, "task", &mut context)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(step.calls.load(Ordering::SeqCst), 3);
        assert!(sink.names().contains(&"step_retry_success"));
    }

    #[tokio::test]
    async fn test_step_start_truncates_task() {
        let sink = Arc::new(RecordingSink::default());
        let engine = StepEngine::new().with_events(sink.clone());
        let mut context = ExecutionContext::new();

        engine
            .execute_step(&TestStep::new("s"), &"t".repeat(500), &mut context)
            .await
            .unwrap();

        let task = sink.events()[0].payload["task"].as_str().unwrap().to_string();
        assert_eq!(task.len(), 100);
    }
}
