//! Fan-out step
//!
//! Splits the task into one subtask per worker, runs them concurrently and
//! combines the outputs, either with a combiner worker or by deterministic
//! concatenation in worker order.

use crate::config::ExecutionParams;
use crate::ports::step::Step;
use crate::ports::worker::Worker;
use crate::use_cases::shared::{call_worker, dispatch_all};
use async_trait::async_trait;
use council_domain::{
    ErrorStrategy, ExecutionContext, ExecutionError, PromptTemplate, StepResult, TaskSplitter,
    concatenate_outputs,
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Parallel distribution of a task across workers
pub struct FanOutStep {
    name: String,
    workers: Vec<Arc<dyn Worker>>,
    splitter: TaskSplitter,
    combiner: Option<Arc<dyn Worker>>,
    strategy: ErrorStrategy,
    params: ExecutionParams,
}

impl FanOutStep {
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Self {
        Self {
            name: "fan_out".to_string(),
            workers,
            splitter: TaskSplitter::Replicate,
            combiner: None,
            strategy: ErrorStrategy::Halt,
            params: ExecutionParams::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_splitter(mut self, splitter: TaskSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_combiner(mut self, combiner: Arc<dyn Worker>) -> Self {
        self.combiner = Some(combiner);
        self
    }

    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    fn worker_names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name().to_string()).collect()
    }
}

#[async_trait]
impl Step for FanOutStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.workers.is_empty() {
            errors.push("Fan-out requires at least 1 worker".to_string());
        }

        let mut seen = HashSet::new();
        for name in self.worker_names() {
            if !seen.insert(name.clone()) {
                errors.push(format!("Duplicate worker name: {}", name));
            }
        }

        errors
    }

    fn error_strategy(&self) -> ErrorStrategy {
        self.strategy.clone()
    }

    async fn execute(
        &self,
        task: &str,
        context: &ExecutionContext,
    ) -> Result<StepResult, ExecutionError> {
        let names = self.worker_names();
        let subtasks = self.splitter.split(task, &names)?;

        info!(
            "Fan-out {}: dispatching {} subtasks ({})",
            self.name,
            subtasks.len(),
            self.splitter.as_str()
        );

        let rendered_context = context.to_prompt_context();
        let prompts = subtasks
            .iter()
            .map(|s| PromptTemplate::subtask(&s.text, &rendered_context))
            .collect();
        let results = dispatch_all(
            &self.workers,
            prompts,
            self.params.max_workers,
            self.params.worker_timeout,
        )
        .await;

        let mut individual = Map::new();
        let mut labeled = Vec::with_capacity(results.len());
        for ((subtask, name), result) in subtasks.iter().zip(&names).zip(results) {
            let output = result?;
            individual.insert(subtask.key.clone(), Value::String(output.clone()));
            labeled.push((name.clone(), output));
        }

        let mut metadata = Map::new();
        let output = match &self.combiner {
            Some(combiner) => {
                let prompt = PromptTemplate::combiner(task, &labeled);
                let combined =
                    call_worker(combiner.as_ref(), &prompt, self.params.worker_timeout).await?;
                metadata.insert(
                    "combined_by".into(),
                    Value::String(combiner.name().to_string()),
                );
                combined
            }
            None => concatenate_outputs(&labeled),
        };

        metadata.insert("individual_results".into(), Value::Object(individual));
        metadata.insert(
            "strategy".into(),
            Value::String(self.splitter.as_str().to_string()),
        );
        metadata.insert(
            "workers".into(),
            Value::Array(names.into_iter().map(Value::String).collect()),
        );

        Ok(StepResult::new(output, metadata, true))
    }
}
