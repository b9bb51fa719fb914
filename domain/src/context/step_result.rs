//! Step result value object

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one step of a council run (Value Object)
///
/// Produced once by the step engine and never mutated afterwards. The
/// builder methods consume `self`, so a result can only be shaped before
/// it is handed out.
///
/// # Example
///
/// ```
/// use council_domain::StepResult;
///
/// let result = StepResult::ok("Use a bounded channel")
///     .with_metadata("winner", "sec");
/// assert!(result.success());
/// assert_eq!(result.metadata()["winner"], "sec");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    output: String,
    #[serde(default)]
    metadata: Map<String, Value>,
    success: bool,
}

impl StepResult {
    pub fn new(output: impl Into<String>, metadata: Map<String, Value>, success: bool) -> Self {
        Self {
            output: output.into(),
            metadata,
            success,
        }
    }

    /// Create a successful result with empty metadata
    pub fn ok(output: impl Into<String>) -> Self {
        Self::new(output, Map::new(), true)
    }

    /// Create a failed result carrying the error message in `metadata.error`
    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(output, Map::new(), false).with_metadata("error", error.into())
    }

    /// Add (or overwrite) a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge a whole metadata map, keeping insertion order
    pub fn with_metadata_map(mut self, entries: Map<String, Value>) -> Self {
        for (key, value) in entries {
            self.metadata.insert(key, value);
        }
        self
    }

    /// Return the same result with `success = false`
    pub fn into_failed(mut self) -> Self {
        self.success = false;
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Error message recorded in metadata, if any
    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").and_then(Value::as_str)
    }
}
