//! Council assembly from file configuration
//!
//! Turns a [`FileConfig`] into a runnable [`Council`]: one
//! [`CommandWorker`] per `[[workers]]` entry and one step per `[[steps]]`
//! entry, with the `[council]` section supplying defaults.

use super::file_config::{FileConfig, FileCouncilConfig, FileStepConfig, FileStepKind};
use crate::workers::CommandWorker;
use council_application::{Council, DebateStep, ExecutionParams, FanOutStep, Step, Worker};
use council_domain::{Backoff, ErrorStrategy, StepResult, TaskSplitter, VotingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Upper bound on the exponential retry delay
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration that cannot be assembled into a council
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No workers configured (add [[workers]] entries or use -w NAME=COMMAND)")]
    NoWorkers,

    #[error("Worker has an empty name")]
    EmptyWorkerName,

    #[error("Duplicate worker name: {0}")]
    DuplicateWorker(String),

    #[error("Worker {0} has an empty command")]
    EmptyCommand(String),

    #[error("Step {step} references unknown worker: {worker}")]
    UnknownWorker { step: String, worker: String },

    #[error("Unknown error strategy: {0}. Valid: halt, continue, retry, fallback")]
    UnknownStrategy(String),

    #[error("Step {step}: {message}")]
    InvalidOption { step: String, message: String },
}

/// Builds councils from configuration
pub struct CouncilFactory<'a> {
    config: &'a FileConfig,
    workers: HashMap<String, Arc<dyn Worker>>,
    params: ExecutionParams,
}

impl<'a> CouncilFactory<'a> {
    /// Validate the worker definitions and prepare the worker adapters
    pub fn new(config: &'a FileConfig) -> Result<Self, ConfigError> {
        if config.workers.is_empty() {
            return Err(ConfigError::NoWorkers);
        }

        let mut workers: HashMap<String, Arc<dyn Worker>> = HashMap::new();
        for def in &config.workers {
            if def.name.trim().is_empty() {
                return Err(ConfigError::EmptyWorkerName);
            }
            if def.command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand(def.name.clone()));
            }

            let mut worker = CommandWorker::new(&def.name, &def.command);
            if let Some(model) = &def.model {
                worker = worker.with_model(model);
            }
            if let Some(secs) = def.timeout_secs.or(config.council.worker_timeout_secs) {
                worker = worker.with_timeout(Duration::from_secs(secs));
            }

            if workers.insert(def.name.clone(), Arc::new(worker)).is_some() {
                return Err(ConfigError::DuplicateWorker(def.name.clone()));
            }
        }

        Ok(Self {
            config,
            workers,
            params: execution_params(&config.council),
        })
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    /// Assemble the council.
    ///
    /// With no `[[steps]]` configured, a single replicate fan-out over all
    /// workers is used.
    pub fn build(&self) -> Result<Council, ConfigError> {
        let steps = if self.config.steps.is_empty() {
            vec![self.build_step(&FileStepConfig::new(FileStepKind::FanOut))?]
        } else {
            self.config
                .steps
                .iter()
                .map(|step| self.build_step(step))
                .collect::<Result<Vec<_>, _>>()?
        };

        debug!(
            "Assembled council {} with {} steps",
            self.config.council.name,
            steps.len()
        );
        Ok(Council::new(&self.config.council.name, steps))
    }

    fn build_step(&self, step: &FileStepConfig) -> Result<Arc<dyn Step>, ConfigError> {
        let name = step.display_name();
        let workers = self.step_workers(step)?;
        let strategy = self.error_strategy(step)?;

        let built: Arc<dyn Step> = match step.kind {
            FileStepKind::Debate => {
                let mut debate = DebateStep::new(workers.clone())
                    .with_name(name)
                    .with_error_strategy(strategy)
                    .with_params(self.params.clone())
                    .with_voting(self.voting(step, &workers)?);
                if let Some(rounds) = step.rounds {
                    debate = debate.with_rounds(rounds);
                }
                if let Some(allow) = step.allow_self_voting {
                    debate = debate.with_self_voting(allow);
                }
                if let Some(moderator) = &step.moderator {
                    debate = debate.with_moderator(self.worker(name, moderator)?);
                }
                Arc::new(debate)
            }
            FileStepKind::FanOut => {
                let mut fan_out = FanOutStep::new(workers)
                    .with_name(name)
                    .with_error_strategy(strategy)
                    .with_params(self.params.clone())
                    .with_splitter(self.splitter(step)?);
                if let Some(combiner) = &step.combiner {
                    fan_out = fan_out.with_combiner(self.worker(name, combiner)?);
                }
                Arc::new(fan_out)
            }
        };
        Ok(built)
    }

    /// Workers named by the step, or all workers in configured order
    fn step_workers(&self, step: &FileStepConfig) -> Result<Vec<Arc<dyn Worker>>, ConfigError> {
        let names: Vec<&str> = if step.workers.is_empty() {
            self.config.workers.iter().map(|w| w.name.as_str()).collect()
        } else {
            step.workers.iter().map(String::as_str).collect()
        };
        names
            .into_iter()
            .map(|worker| self.worker(step.display_name(), worker))
            .collect()
    }

    fn worker(&self, step: &str, name: &str) -> Result<Arc<dyn Worker>, ConfigError> {
        self.workers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownWorker {
                step: step.to_string(),
                worker: name.to_string(),
            })
    }

    fn error_strategy(&self, step: &FileStepConfig) -> Result<ErrorStrategy, ConfigError> {
        let council = &self.config.council;
        let on_error = step.on_error.as_deref().unwrap_or(&council.on_error);

        match on_error.to_lowercase().as_str() {
            "halt" => Ok(ErrorStrategy::Halt),
            "continue" => Ok(ErrorStrategy::Continue),
            "retry" => Ok(ErrorStrategy::Retry {
                max_attempts: step.max_retries.unwrap_or(council.max_retries),
                backoff: Backoff::Exponential {
                    base: Duration::from_millis(council.retry_backoff_ms),
                    max: MAX_RETRY_BACKOFF,
                },
            }),
            "fallback" => {
                let output = step
                    .fallback_output
                    .as_deref()
                    .unwrap_or(&council.fallback_output);
                Ok(ErrorStrategy::Fallback(StepResult::ok(output)))
            }
            _ => Err(ConfigError::UnknownStrategy(on_error.to_string())),
        }
    }

    fn voting(
        &self,
        step: &FileStepConfig,
        workers: &[Arc<dyn Worker>],
    ) -> Result<VotingStrategy, ConfigError> {
        let voting = step
            .voting
            .as_deref()
            .unwrap_or("majority")
            .parse::<VotingStrategy>()
            .map_err(|message| ConfigError::InvalidOption {
                step: step.display_name().to_string(),
                message,
            })?;

        Ok(match voting {
            VotingStrategy::Weighted(_) => VotingStrategy::Weighted(
                workers
                    .iter()
                    .filter_map(|w| {
                        let weight = self.config.worker(w.name())?.weight?;
                        Some((w.name().to_string(), weight))
                    })
                    .collect(),
            ),
            majority => majority,
        })
    }

    fn splitter(&self, step: &FileStepConfig) -> Result<TaskSplitter, ConfigError> {
        let splitter = step
            .splitter
            .as_deref()
            .unwrap_or("replicate")
            .parse::<TaskSplitter>()
            .map_err(|message| ConfigError::InvalidOption {
                step: step.display_name().to_string(),
                message,
            })?;

        Ok(match splitter {
            TaskSplitter::Domains(_) if !step.domains.is_empty() => {
                TaskSplitter::Domains(step.domains.clone())
            }
            other => other,
        })
    }
}

/// Execution parameters from the `[council]` section
pub fn execution_params(council: &FileCouncilConfig) -> ExecutionParams {
    ExecutionParams::default()
        .with_max_workers(council.max_workers)
        .with_worker_timeout(council.worker_timeout_secs.map(Duration::from_secs))
        .with_tool_timeout(council.tool_timeout_secs.map(Duration::from_secs))
        .with_cache_capacity(council.cache_capacity)
}
