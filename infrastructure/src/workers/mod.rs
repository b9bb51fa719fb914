//! Worker adapters
//!
//! Implementations of the [`Worker`](council_application::Worker) port.

mod command;

pub use command::CommandWorker;
