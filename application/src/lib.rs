//! Application layer for council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    event_sink::{CompositeEventSink, CouncilEvent, EventSink, NoEvents},
    step::Step,
    tool::{FnTool, Tool, ToolError},
    worker::Worker,
};
pub use use_cases::council_pool::{CouncilPool, CouncilPoolError, CouncilRunOutcome};
pub use use_cases::debate::DebateStep;
pub use use_cases::dedup_executor::DeduplicatingExecutor;
pub use use_cases::error_policy::ErrorPolicy;
pub use use_cases::fan_out::FanOutStep;
pub use use_cases::run_council::{Council, CouncilError, CouncilOutput};
pub use use_cases::step_engine::{StepEngine, StepEngineError};
