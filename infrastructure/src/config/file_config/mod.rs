//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; turning them into a runnable council
//! happens in [`factory`](super::factory).

mod council;
mod output;
mod steps;
mod workers;

pub use council::FileCouncilConfig;
pub use output::FileOutputConfig;
pub use steps::{FileStepConfig, FileStepKind};
pub use workers::FileWorkerConfig;

use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council-wide settings
    pub council: FileCouncilConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Worker definitions (`[[workers]]`)
    pub workers: Vec<FileWorkerConfig>,
    /// Step pipeline (`[[steps]]`), run in order
    pub steps: Vec<FileStepConfig>,
}

impl FileConfig {
    pub fn worker(&self, name: &str) -> Option<&FileWorkerConfig> {
        self.workers.iter().find(|w| w.name == name)
    }

    /// Add a worker, replacing any configured worker with the same name
    pub fn upsert_worker(&mut self, worker: FileWorkerConfig) {
        match self.workers.iter_mut().find(|w| w.name == worker.name) {
            Some(existing) => *existing = worker,
            None => self.workers.push(worker),
        }
    }
}
