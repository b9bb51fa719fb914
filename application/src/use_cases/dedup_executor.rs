//! Deduplicating tool executor
//!
//! Runs a tool over a batch of argument sets with bounded concurrency.
//! Argument sets with the same canonical key are invoked once and their
//! value is copied to every position that requested it. Values (including
//! errors) are cached for the lifetime of the executor.
//!
//! ```text
//! batch ─▶ group by canonical key ─▶ claim once-cell per key ─▶ invoke (≤ max_workers) ─▶ fan out
//! ```

use crate::config::ExecutionParams;
use crate::ports::tool::Tool;
use council_domain::{WorkUnit, group_work_units};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, warn};

type Slot = Arc<OnceCell<Value>>;

#[derive(Default)]
struct Cache {
    entries: HashMap<String, Slot>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

/// Bounded, caching, order-preserving tool dispatch
pub struct DeduplicatingExecutor {
    semaphore: Arc<Semaphore>,
    tool_timeout: Option<Duration>,
    capacity: usize,
    cache: Mutex<Cache>,
}

impl Default for DeduplicatingExecutor {
    fn default() -> Self {
        Self::new(&ExecutionParams::default())
    }
}

impl DeduplicatingExecutor {
    pub fn new(params: &ExecutionParams) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(params.max_workers.max(1))),
            tool_timeout: params.tool_timeout,
            capacity: params.cache_capacity,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Number of cached values
    pub fn cache_len(&self) -> usize {
        self.cache().entries.len()
    }

    /// Lock the cache, recovering it if a holder panicked.
    ///
    /// Every critical section leaves `entries` and `order` consistent, so a
    /// poisoned cache is still valid.
    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            warn!("Executor cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Invoke `tool` for every argument set in `batch`.
    ///
    /// The output has the same length as `batch` and `output[i]` belongs to
    /// `batch[i]`. Failures come back as `"Error: <message>"` string values.
    pub async fn execute_parallel(
        &self,
        tool: Arc<dyn Tool>,
        batch: Vec<Map<String, Value>>,
    ) -> Vec<Value> {
        if batch.is_empty() {
            return Vec::new();
        }

        let units = group_work_units(tool.name(), &batch);
        debug!(
            "Executing {} with {} argument sets ({} unique)",
            tool.name(),
            batch.len(),
            units.len()
        );

        let slots: Vec<Slot> = units.iter().map(|u| self.claim(&u.canonical_key)).collect();

        let values = join_all(
            units
                .iter()
                .zip(&slots)
                .map(|(unit, slot)| self.resolve(tool.as_ref(), unit, slot)),
        )
        .await;

        let mut output = vec![Value::Null; batch.len()];
        for (unit, value) in units.iter().zip(values) {
            for &position in &unit.origin_positions {
                output[position] = value.clone();
            }
        }
        output
    }

    /// Cell for `key`, inserted on first sight.
    ///
    /// The first caller to insert a key owns its computation; every other
    /// caller, in this batch or a concurrent one, waits on the same cell.
    fn claim(&self, key: &str) -> Slot {
        let mut cache = self.cache();

        if let Some(slot) = cache.entries.get(key) {
            return Arc::clone(slot);
        }

        let slot: Slot = Arc::new(OnceCell::new());
        if self.capacity == 0 {
            return slot;
        }

        while cache.entries.len() >= self.capacity {
            let Some(oldest) = cache.order.pop_front() else {
                break;
            };
            cache.entries.remove(&oldest);
        }
        cache.entries.insert(key.to_string(), Arc::clone(&slot));
        cache.order.push_back(key.to_string());
        slot
    }

    async fn resolve(&self, tool: &dyn Tool, unit: &WorkUnit, slot: &Slot) -> Value {
        if let Some(value) = slot.get() {
            debug!("Cache hit for {}", unit.canonical_key);
            return value.clone();
        }

        slot.get_or_init(|| self.invoke(tool, &unit.arguments))
            .await
            .clone()
    }

    async fn invoke(&self, tool: &dyn Tool, args: &Map<String, Value>) -> Value {
        let Ok(_permit) = self.semaphore.acquire().await else {
            return Value::String("Error: executor is shut down".to_string());
        };

        let result = match self.tool_timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.call(args)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Tool {} timed out after {:?}", tool.name(), limit);
                    return Value::String(format!(
                        "Error: timed out after {}ms",
                        limit.as_millis()
                    ));
                }
            },
            None => tool.call(args).await,
        };

        match result {
            Ok(value) => value,
            Err(e) => {
                warn!("Tool {} failed: {}", tool.name(), e);
                Value::String(format!("Error: {}", e))
            }
        }
    }
}
