//! Shared utilities for use cases.
//!
//! Contains cancellation checking and bounded, order-preserving dispatch of
//! prompts to workers, used by the debate and fan-out steps.

use crate::ports::worker::Worker;
use council_domain::ExecutionError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Check if cancellation has been requested.
///
/// Returns `Err(ExecutionError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), ExecutionError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(ExecutionError::Cancelled);
    }
    Ok(())
}

/// Call one worker, applying the optional timeout.
pub(crate) async fn call_worker(
    worker: &dyn Worker,
    prompt: &str,
    timeout: Option<Duration>,
) -> Result<String, ExecutionError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, worker.work_on(prompt))
            .await
            .map_err(|_| ExecutionError::timeout(worker.name(), limit))?,
        None => worker.work_on(prompt).await,
    }
}

/// Send `prompts[i]` to `workers[i]` concurrently.
///
/// At most `max_workers` calls run at once. The returned vector is aligned
/// with the inputs regardless of completion order. Dropping the returned
/// future aborts every call still in flight.
pub(crate) async fn dispatch_all(
    workers: &[Arc<dyn Worker>],
    prompts: Vec<String>,
    max_workers: usize,
    timeout: Option<Duration>,
) -> Vec<Result<String, ExecutionError>> {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut join_set = JoinSet::new();

    for (index, (worker, prompt)) in workers.iter().zip(prompts).enumerate() {
        let worker = Arc::clone(worker);
        let semaphore = Arc::clone(&semaphore);

        join_set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => call_worker(worker.as_ref(), &prompt, timeout).await,
                Err(_) => Err(ExecutionError::Cancelled),
            };
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<String, ExecutionError>>> =
        (0..workers.len()).map(|_| None).collect();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => {
                if let Err(e) = &result {
                    debug!("Worker {} failed: {}", workers[index].name(), e);
                }
                results[index] = Some(result);
            }
            Err(e) => {
                warn!("Worker task join error: {}", e);
            }
        }
    }

    results
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                Err(ExecutionError::worker(
                    workers[index].name(),
                    "worker task aborted",
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::worker::testing::{GaugedWorker, ScriptedWorker};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_check_cancelled() {
        assert!(check_cancelled(&None).is_ok());
        let token = CancellationToken::new();
        assert!(check_cancelled(&Some(token.clone())).is_ok());
        token.cancel();
        assert_eq!(
            check_cancelled(&Some(token)).unwrap_err(),
            ExecutionError::Cancelled
        );
    }

    #[tokio::test]
    async fn test_results_are_aligned_with_inputs() {
        let workers: Vec<Arc<dyn Worker>> = vec![
            Arc::new(ScriptedWorker::fixed("slow", "first").with_delay(Duration::from_millis(30))),
            Arc::new(ScriptedWorker::failing("broken", "boom")),
            Arc::new(ScriptedWorker::fixed("fast", "third")),
        ];
        let prompts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let results = dispatch_all(&workers, prompts, 3, None).await;

        assert_eq!(results[0].as_deref(), Ok("first"));
        assert_eq!(
            results[1].as_ref().unwrap_err().to_string(),
            "Worker broken failed: boom"
        );
        assert_eq!(results[2].as_deref(), Ok("third"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let workers: Vec<Arc<dyn Worker>> = (0..6)
            .map(|i| {
                Arc::new(GaugedWorker::new(
                    &format!("w{}", i),
                    active.clone(),
                    peak.clone(),
                )) as Arc<dyn Worker>
            })
            .collect();
        let prompts = (0..6).map(|i| i.to_string()).collect();

        let results = dispatch_all(&workers, prompts, 2, None).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_timeout_becomes_error() {
        let workers: Vec<Arc<dyn Worker>> = vec![Arc::new(
            ScriptedWorker::fixed("sleepy", "late").with_delay(Duration::from_millis(200)),
        )];

        let results = dispatch_all(
            &workers,
            vec!["t".to_string()],
            1,
            Some(Duration::from_millis(10)),
        )
        .await;

        let err = results[0].as_ref().unwrap_err();
        assert_eq!(
            err,
            &ExecutionError::timeout("sleepy", Duration::from_millis(10))
        );
        assert_eq!(err.to_string(), "Worker sleepy timed out after 10ms");
    }
}
