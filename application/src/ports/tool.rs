//! Tool port
//!
//! Defines the interface the deduplicating executor consumes: a named
//! operation over a JSON argument set.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors a tool can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),
}

/// Port for tools
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Invoke the tool with one argument set
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, ToolError>;
}

/// Adapts a synchronous closure into a [`Tool`]
///
/// ```
/// use council_application::ports::tool::{FnTool, Tool};
/// use serde_json::{Map, Value};
///
/// let tool = FnTool::new("upper", |args: &Map<String, Value>| {
///     Ok(Value::from(args["v"].as_str().unwrap_or_default().to_uppercase()))
/// });
/// assert_eq!(tool.name(), "upper");
/// ```
pub struct FnTool<F> {
    name: String,
    f: F,
}

impl<F> FnTool<F>
where
    F: Fn(&Map<String, Value>) -> Result<Value, ToolError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&Map<String, Value>) -> Result<Value, ToolError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        (self.f)(args)
    }
}
