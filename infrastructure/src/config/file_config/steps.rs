//! Step pipeline from TOML (`[[steps]]` array)

use serde::{Deserialize, Serialize};

/// Kind of coordination a step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStepKind {
    #[default]
    FanOut,
    Debate,
}

impl FileStepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStepKind::FanOut => "fan_out",
            FileStepKind::Debate => "debate",
        }
    }
}

/// Raw step configuration.
///
/// Options that do not apply to the step's kind are ignored; unset options
/// fall back to the step defaults and to the `[council]` section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStepConfig {
    pub kind: FileStepKind,
    /// Step name (defaults to the kind)
    pub name: Option<String>,
    /// Participating workers; empty means all configured workers
    pub workers: Vec<String>,

    // Debate options
    pub rounds: Option<usize>,
    /// majority | weighted
    pub voting: Option<String>,
    pub allow_self_voting: Option<bool>,
    pub moderator: Option<String>,

    // Fan-out options
    /// replicate | by_lines | domains
    pub splitter: Option<String>,
    pub domains: Vec<String>,
    pub combiner: Option<String>,

    // Error handling overrides
    pub on_error: Option<String>,
    pub max_retries: Option<u32>,
    pub fallback_output: Option<String>,
}

impl FileStepConfig {
    pub fn new(kind: FileStepKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.as_str())
    }
}
