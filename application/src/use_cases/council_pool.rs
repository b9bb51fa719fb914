//! Concurrent execution of several councils.
//!
//! Each council runs on its own task; a failing council is reported in its
//! own outcome and never aborts its siblings.

use crate::use_cases::run_council::{Council, CouncilError, CouncilOutput};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Default bound on councils running at once
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouncilPoolError {
    #[error("Got {councils} councils but {tasks} tasks")]
    LengthMismatch { councils: usize, tasks: usize },
}

/// Outcome of one council in a pool run
#[derive(Debug, Clone, PartialEq)]
pub enum CouncilRunOutcome {
    Completed(CouncilOutput),
    Failed { council: String, error: CouncilError },
}

impl CouncilRunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CouncilRunOutcome::Completed(_))
    }

    pub fn council(&self) -> &str {
        match self {
            CouncilRunOutcome::Completed(output) => &output.council,
            CouncilRunOutcome::Failed { council, .. } => council,
        }
    }
}

/// Runs councils concurrently with a bound
pub struct CouncilPool {
    max_concurrent: usize,
}

impl Default for CouncilPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl CouncilPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run `councils[i]` on `tasks[i]`, at most `max_concurrent` at a time.
    ///
    /// Outcomes are returned in input order.
    pub async fn execute_many(
        &self,
        councils: &[Arc<Council>],
        tasks: &[String],
    ) -> Result<Vec<CouncilRunOutcome>, CouncilPoolError> {
        if councils.len() != tasks.len() {
            return Err(CouncilPoolError::LengthMismatch {
                councils: councils.len(),
                tasks: tasks.len(),
            });
        }

        info!(
            "Running {} councils (max {} concurrent)",
            councils.len(),
            self.max_concurrent
        );
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let runs = councils.iter().zip(tasks).map(|(council, task)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await;
                match council.execute(task).await {
                    Ok(output) => CouncilRunOutcome::Completed(output),
                    Err(error) => {
                        warn!("Council {} failed: {}", council.name(), error);
                        CouncilRunOutcome::Failed {
                            council: council.name().to_string(),
                            error,
                        }
                    }
                }
            }
        });

        Ok(join_all(runs).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::step::Step;
    use crate::ports::worker::Worker;
    use crate::ports::worker::testing::{GaugedWorker, ScriptedWorker};
    use crate::use_cases::fan_out::FanOutStep;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn council(name: &str, worker: ScriptedWorker) -> Arc<Council> {
        let workers: Vec<Arc<dyn Worker>> = vec![Arc::new(worker)];
        let step: Arc<dyn Step> = Arc::new(FanOutStep::new(workers));
        Arc::new(Council::new(name, vec![step]))
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let councils = vec![
            council("one", ScriptedWorker::fixed("w", "fine")),
            council("two", ScriptedWorker::failing("w", "down")),
            council("three", ScriptedWorker::fixed("w", "also fine")),
        ];
        let tasks = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let outcomes = CouncilPool::default()
            .execute_many(&councils, &tasks)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_completed());
        assert!(!outcomes[1].is_completed());
        assert_eq!(outcomes[1].council(), "two");
        assert!(outcomes[2].is_completed());
        if let CouncilRunOutcome::Completed(output) = &outcomes[2] {
            assert_eq!(output.final_output(), Some("w: also fine"));
        }
    }

    #[tokio::test]
    async fn test_concurrent_councils_are_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let councils: Vec<Arc<Council>> = (0..6)
            .map(|i| {
                let workers: Vec<Arc<dyn Worker>> = vec![Arc::new(GaugedWorker::new(
                    "w",
                    active.clone(),
                    peak.clone(),
                ))];
                let step: Arc<dyn Step> = Arc::new(FanOutStep::new(workers));
                Arc::new(Council::new(format!("c{}", i), vec![step]))
            })
            .collect();
        let tasks: Vec<String> = (0..6).map(|i| i.to_string()).collect();

        let outcomes = CouncilPool::new(2)
            .execute_many(&councils, &tasks)
            .await
            .unwrap();

        assert!(outcomes.iter().all(CouncilRunOutcome::is_completed));
        assert_eq!(outcomes[4].council(), "c4");
        let peak = peak.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak was {}", peak);
    }

    #[tokio::test]
    async fn test_length_mismatch_is_rejected() {
        let councils = vec![council("one", ScriptedWorker::fixed("w", "x"))];
        let err = CouncilPool::new(2)
            .execute_many(&councils, &[])
            .await
            .unwrap_err();
        assert_eq!(err, CouncilPoolError::LengthMismatch { councils: 1, tasks: 0 });
    }
}
