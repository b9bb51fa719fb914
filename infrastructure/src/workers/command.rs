//! Shell command worker
//!
//! Runs a shell command per task: the task text is written to the
//! command's stdin and its stdout is the worker's response. This lets any
//! CLI (an LLM client, a script, `cat`) participate in a council.

use async_trait::async_trait;
use council_application::ports::worker::Worker;
use council_domain::ExecutionError;
use council_domain::core::string::truncate;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Default timeout for one command invocation (120 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Maximum stderr excerpt carried in an error message
const MAX_STDERR_IN_ERROR: usize = 500;

/// Worker backed by a shell command
#[derive(Debug, Clone)]
pub struct CommandWorker {
    name: String,
    model: Option<String>,
    command: String,
    timeout: Duration,
}

impl CommandWorker {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            command: command.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell(&self) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", &self.command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", &self.command]);
            c
        };
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(model) = &self.model {
            cmd.env("COUNCIL_MODEL", model);
        }
        cmd.env("COUNCIL_WORKER", &self.name);
        cmd
    }

    async fn run(&self, task: &str) -> Result<String, ExecutionError> {
        let mut child = self
            .shell()
            .spawn()
            .map_err(|e| ExecutionError::worker(&self.name, format!("failed to spawn: {}", e)))?;

        // stdout is drained while stdin is written, so a command that echoes
        // as it reads cannot fill its output pipe and stall the write.
        let stdin = child.stdin.take();
        let write_task = async move {
            if let Some(mut stdin) = stdin {
                // A command that ignores stdin may close it early; that is not an error.
                if let Err(e) = stdin.write_all(task.as_bytes()).await {
                    debug!("Worker {} closed stdin early: {}", self.name, e);
                }
            }
        };
        let ((), output) = tokio::join!(write_task, child.wait_with_output());
        let output = output.map_err(|e| ExecutionError::worker(&self.name, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ExecutionError::worker(
                &self.name,
                format!(
                    "exit status {}: {}",
                    code,
                    truncate(stderr.trim(), MAX_STDERR_IN_ERROR)
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[async_trait]
impl Worker for CommandWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    async fn work_on(&self, task: &str) -> Result<String, ExecutionError> {
        debug!("Worker {} running: {}", self.name, self.command);
        tokio::time::timeout(self.timeout, self.run(task))
            .await
            .map_err(|_| ExecutionError::timeout(&self.name, self.timeout))?
    }
}
