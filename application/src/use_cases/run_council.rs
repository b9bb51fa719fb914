//! Run Council use case
//!
//! Runs a sequence of steps against one execution context, strictly in
//! order, collecting one [`StepResult`] per step.

use crate::ports::event_sink::{CouncilEvent, names};
use crate::ports::step::Step;
use crate::use_cases::shared::check_cancelled;
use crate::use_cases::step_engine::{StepEngine, StepEngineError};
use council_domain::{ExecutionContext, StepResult};
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that abort a council run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouncilError {
    /// A step failed fatally. `partial` holds the results of the steps that
    /// completed before it, so the aborted step and every later one are absent.
    #[error("Council aborted after {} completed steps", .partial.results.len())]
    Aborted {
        partial: Box<CouncilOutput>,
        source: StepEngineError,
    },

    #[error("Council run cancelled")]
    Cancelled,
}

impl CouncilError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CouncilError::Cancelled)
    }

    /// Output accumulated before the abort
    pub fn partial(&self) -> Option<&CouncilOutput> {
        match self {
            CouncilError::Aborted { partial, .. } => Some(partial.as_ref()),
            CouncilError::Cancelled => None,
        }
    }

    pub fn step_error(&self) -> Option<&StepEngineError> {
        match self {
            CouncilError::Aborted { source, .. } => Some(source),
            CouncilError::Cancelled => None,
        }
    }
}

/// Output of a completed council run
#[derive(Debug, Clone, PartialEq)]
pub struct CouncilOutput {
    pub council: String,
    /// One result per step, in step order
    pub results: Vec<StepResult>,
    /// Data entries of the context at the end of the run
    pub data: Map<String, Value>,
}

impl CouncilOutput {
    /// Output of the last step, if any step ran
    pub fn final_output(&self) -> Option<&str> {
        self.results.last().map(StepResult::output)
    }

    /// Whether every step produced a successful result
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(StepResult::success)
    }
}

/// Results keyed as `step_<i>`
struct IndexedResults<'a>(&'a [StepResult]);

impl Serialize for IndexedResults<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, result) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("step_{}", i), result)?;
        }
        map.end()
    }
}

impl Serialize for CouncilOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CouncilOutput", 3)?;
        state.serialize_field("council", &self.council)?;
        state.serialize_field("results", &IndexedResults(&self.results))?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

/// A named sequence of steps
pub struct Council {
    name: String,
    steps: Vec<Arc<dyn Step>>,
    engine: StepEngine,
    initial_data: Map<String, Value>,
    cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for Council {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Council")
            .field("name", &self.name)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("cancellable", &self.cancellation.is_some())
            .finish()
    }
}

impl Council {
    pub fn new(name: impl Into<String>, steps: Vec<Arc<dyn Step>>) -> Self {
        Self {
            name: name.into(),
            steps,
            engine: StepEngine::new(),
            initial_data: Map::new(),
            cancellation: None,
        }
    }

    /// Use `engine` (and its event sink) to run steps
    pub fn with_engine(mut self, engine: StepEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Seed every run's context with `data`
    pub fn with_initial_data(mut self, data: Map<String, Value>) -> Self {
        self.initial_data = data;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn add_step(&mut self, step: Arc<dyn Step>) {
        self.steps.push(step);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }

    /// Run every step against a fresh context seeded with the initial data.
    ///
    /// The first step error aborts the run; steps tolerating failure
    /// (`Continue`, `Fallback`) record a failed result and the run goes on.
    pub async fn execute(&self, task: &str) -> Result<CouncilOutput, CouncilError> {
        let mut context = ExecutionContext::with_data(self.initial_data.clone());

        info!(
            "Starting council {} with {} steps",
            self.name,
            self.steps.len()
        );
        self.emit(
            names::COUNCIL_STARTED,
            json!({ "council": self.name, "task": task }),
        )
        .await;

        for step in &self.steps {
            check_cancelled(&self.cancellation).map_err(|_| CouncilError::Cancelled)?;

            let run = self.engine.execute_step(step.as_ref(), task, &mut context);
            let outcome = match &self.cancellation {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        warn!("Council {} cancelled during step {}", self.name, step.name());
                        return Err(CouncilError::Cancelled);
                    }
                    outcome = run => outcome,
                },
                None => run.await,
            };

            match outcome {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(CouncilError::Cancelled),
                Err(e) => {
                    warn!(
                        "Council {} aborted at step {} after {} completed steps",
                        self.name,
                        step.name(),
                        context.len()
                    );
                    return Err(CouncilError::Aborted {
                        partial: Box::new(self.snapshot(&context)),
                        source: e,
                    });
                }
            }
        }

        self.emit(
            names::COUNCIL_COMPLETED,
            json!({ "council": self.name, "steps_completed": context.len() }),
        )
        .await;
        info!("Council {} completed", self.name);

        Ok(self.snapshot(&context))
    }

    fn snapshot(&self, context: &ExecutionContext) -> CouncilOutput {
        CouncilOutput {
            council: self.name.clone(),
            results: context.get_results(),
            data: context.data_snapshot(),
        }
    }

    async fn emit(&self, name: &'static str, payload: Value) {
        self.engine
            .events()
            .emit_async(CouncilEvent::new(name, payload))
            .await;
    }
}
