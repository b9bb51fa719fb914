//! Worker definitions from TOML (`[[workers]]` array)

use serde::{Deserialize, Serialize};

/// One configured worker: a named shell command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkerConfig {
    pub name: String,
    /// Model identifier, exported to the command as `COUNCIL_MODEL`
    pub model: Option<String>,
    /// Shell command; the task text is written to its stdin
    pub command: String,
    /// Vote weight under weighted voting (default 1.0)
    pub weight: Option<f64>,
    /// Overrides `council.worker_timeout_secs` for this worker
    pub timeout_secs: Option<u64>,
}

impl FileWorkerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    /// Parse a `NAME=COMMAND` command-line definition
    pub fn parse_definition(definition: &str) -> Option<Self> {
        let (name, command) = definition.split_once('=')?;
        let (name, command) = (name.trim(), command.trim());
        if name.is_empty() || command.is_empty() {
            return None;
        }
        Some(Self::new(name, command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition() {
        let worker = FileWorkerConfig::parse_definition("sec=llm -m gpt-5 --flag=x").unwrap();
        assert_eq!(worker.name, "sec");
        assert_eq!(worker.command, "llm -m gpt-5 --flag=x");

        assert!(FileWorkerConfig::parse_definition("no-separator").is_none());
        assert!(FileWorkerConfig::parse_definition("=cat").is_none());
        assert!(FileWorkerConfig::parse_definition("a= ").is_none());
    }
}
