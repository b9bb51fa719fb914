//! Shared, append-only state of one council run.

use super::step_result::StepResult;
use crate::core::string::truncate;
use serde_json::{Map, Value, json};

/// Default character limit for [`ExecutionContext::to_prompt_context`]
pub const DEFAULT_PROMPT_CONTEXT_LIMIT: usize = 2000;

/// Execution context shared by every step of a single council run.
///
/// Holds two things:
/// - `data`: key/value entries, iterated in insertion order
/// - `results`: one [`StepResult`] per completed step, in completion order
///
/// Nothing is ever removed. Mutation requires `&mut self`, and steps only
/// receive `&ExecutionContext`, so the step engine is the single writer of
/// `results` during a run. The type deliberately does not implement
/// `Clone`: a run works on one context, never on an implicit copy.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    data: Map<String, Value>,
    results: Vec<StepResult>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with initial data
    pub fn with_data(initial: Map<String, Value>) -> Self {
        Self {
            data: initial,
            results: Vec::new(),
        }
    }

    /// Insert or overwrite a data entry.
    ///
    /// An overwritten key keeps the position of its first insertion.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Look up a data entry, falling back to `default` when absent
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.data.get(key).unwrap_or(default)
    }

    /// Append a step result
    pub fn add_result(&mut self, result: StepResult) {
        self.results.push(result);
    }

    /// Copy of all step results in completion order
    pub fn get_results(&self) -> Vec<StepResult> {
        self.results.clone()
    }

    /// Borrow the step results without copying
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Snapshot of the data entries
    pub fn data_snapshot(&self) -> Map<String, Value> {
        self.data.clone()
    }

    /// Number of recorded step results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// `true` when neither data nor results have been recorded
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.results.is_empty()
    }

    /// Summary of the context state as JSON
    pub fn summary(&self) -> Value {
        json!({
            "data": self.data,
            "results": self.results,
            "result_count": self.results.len(),
        })
    }

    /// Render the context as auxiliary prompt text for workers.
    ///
    /// Data entries come first in insertion order, then step results in
    /// execution order. An empty context renders as an empty string.
    pub fn to_prompt_context(&self) -> String {
        self.to_prompt_context_with_limit(DEFAULT_PROMPT_CONTEXT_LIMIT)
    }

    /// Same as [`to_prompt_context`](Self::to_prompt_context) with an explicit limit
    pub fn to_prompt_context_with_limit(&self, max_len: usize) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut rendered = String::from("Current Context:\n");

        if !self.data.is_empty() {
            rendered.push_str("Data:\n");
            for (key, value) in &self.data {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                rendered.push_str(&format!("- {}: {}\n", key, value));
            }
        }

        if !self.results.is_empty() {
            rendered.push_str("Results:\n");
            for (i, result) in self.results.iter().enumerate() {
                let status = if result.success() { "ok" } else { "failed" };
                rendered.push_str(&format!("- step_{} [{}]: {}\n", i, status, result.output()));
            }
        }

        truncate(rendered.trim_end(), max_len)
    }
}
