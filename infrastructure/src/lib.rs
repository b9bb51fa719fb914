//! Infrastructure layer for council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod workers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, CouncilFactory, FileConfig, FileCouncilConfig, FileOutputConfig,
    FileStepConfig, FileStepKind, FileWorkerConfig,
};
pub use logging::JsonlEventSink;
pub use workers::CommandWorker;
