//! Configuration file loading for council
//!
//! This module handles file I/O, merging of configuration from multiple
//! sources and assembly of a runnable council. The priority order
//! (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. `COUNCIL_`-prefixed environment variables
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. Global: `$XDG_CONFIG_HOME/council/config.toml`
//! 5. Default values

mod factory;
mod file_config;
mod loader;

pub use factory::{ConfigError, CouncilFactory, execution_params};
pub use file_config::{
    FileConfig, FileCouncilConfig, FileOutputConfig, FileStepConfig, FileStepKind,
    FileWorkerConfig,
};
pub use loader::ConfigLoader;
