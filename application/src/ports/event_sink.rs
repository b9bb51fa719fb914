//! Port for council lifecycle events.
//!
//! Defines the [`EventSink`] trait that receives step and council events
//! (start, completion, failure, retries) as structured JSON payloads.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port feeds progress
//! displays and machine-readable logs (JSONL).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Event names emitted by the engine
pub mod names {
    pub const STEP_START: &str = "step_start";
    pub const STEP_COMPLETE: &str = "step_complete";
    pub const STEP_FAILED: &str = "step_failed";
    pub const STEP_ERROR: &str = "step_error";
    pub const STEP_RETRY_SUCCESS: &str = "step_retry_success";
    pub const COUNCIL_STARTED: &str = "council_started";
    pub const COUNCIL_COMPLETED: &str = "council_completed";
}

/// A structured lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct CouncilEvent {
    /// Event name (see [`names`])
    pub name: &'static str,
    /// JSON payload with event-specific data
    pub payload: Value,
}

impl CouncilEvent {
    pub fn new(name: &'static str, payload: Value) -> Self {
        Self { name, payload }
    }
}

/// Port for receiving lifecycle events.
///
/// Emission is fire-and-forget: implementations must not fail the run, so
/// the method has no error channel. Sinks that do I/O log their own
/// failures.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit_async(&self, event: CouncilEvent);
}

/// No-op sink for tests and when no observer is attached.
pub struct NoEvents;

#[async_trait]
impl EventSink for NoEvents {
    async fn emit_async(&self, _event: CouncilEvent) {}
}

/// A sink that forwards every event to several inner sinks, in order.
///
/// ```text
/// StepEngine ──▶ CompositeEventSink ──┬──▶ ProgressReporter
///                                     └──▶ JsonlEventSink
/// ```
#[derive(Default)]
pub struct CompositeEventSink {
    delegates: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(delegates: Vec<Arc<dyn EventSink>>) -> Self {
        Self { delegates }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.delegates.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit_async(&self, event: CouncilEvent) {
        for sink in &self.delegates {
            sink.emit_async(event.clone()).await;
        }
    }
}

/// Sink that stores events in memory; used by tests across the crate.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: std::sync::Mutex<Vec<CouncilEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<CouncilEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl EventSink for RecordingSink {
    async fn emit_async(&self, event: CouncilEvent) {
        self.events.lock().unwrap().push(event);
    }
}
