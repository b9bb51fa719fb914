//! Progress reporting for council execution
//!
//! Both reporters are [`EventSink`]s: they render the lifecycle events the
//! step engine emits and never influence the run.

use async_trait::async_trait;
use colored::Colorize;
use council_application::ports::event_sink::{CouncilEvent, EventSink, names};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

fn field<'a>(event: &'a CouncilEvent, key: &str) -> &'a str {
    event.payload.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Reports progress with a spinner per running step
pub struct ProgressReporter {
    multi: MultiProgress,
    step_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            step_bar: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn on_step_start(&self, step: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(step.to_string());
        pb.set_message("running...");
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bar) = self.step_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_step_error(&self, event: &CouncilEvent) {
        let attempt = event.payload.get("attempt").and_then(Value::as_u64).unwrap_or(1);
        if let Ok(bar) = self.step_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!(
                "{} attempt {} failed ({})",
                "!".yellow(),
                attempt,
                field(event, "strategy")
            ));
        }
    }

    fn finish(&self, message: String) {
        if let Ok(mut bar) = self.step_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for ProgressReporter {
    async fn emit_async(&self, event: CouncilEvent) {
        match event.name {
            names::STEP_START => self.on_step_start(field(&event, "step")),
            names::STEP_ERROR => self.on_step_error(&event),
            names::STEP_COMPLETE => {
                let success = event
                    .payload
                    .pointer("/result/success")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if success {
                    self.finish(format!("{}", "done".green()));
                } else {
                    self.finish(format!("{}", "recorded as failed".yellow()));
                }
            }
            names::STEP_FAILED => {
                self.finish(format!("{} {}", "failed:".red(), field(&event, "error")));
            }
            _ => {}
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl SimpleProgress {
    fn line(event: &CouncilEvent) -> Option<String> {
        let line = match event.name {
            names::COUNCIL_STARTED => format!(
                "{} {}",
                "->".cyan(),
                format!("Council {}", field(event, "council")).bold()
            ),
            names::STEP_START => format!("  {} {}", "->".cyan(), field(event, "step")),
            names::STEP_COMPLETE => {
                let success = event
                    .payload
                    .pointer("/result/success")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if success {
                    format!("  {} {}", "v".green(), field(event, "step"))
                } else {
                    format!("  {} {} (continued after failure)", "x".yellow(), field(event, "step"))
                }
            }
            names::STEP_FAILED => format!(
                "  {} {}: {}",
                "x".red(),
                field(event, "step"),
                field(event, "error")
            ),
            names::STEP_RETRY_SUCCESS => format!(
                "  {} {} succeeded after {} attempts",
                "v".green(),
                field(event, "step"),
                event.payload.get("attempts").and_then(Value::as_u64).unwrap_or(0)
            ),
            _ => return None,
        };
        Some(line)
    }
}

#[async_trait]
impl EventSink for SimpleProgress {
    async fn emit_async(&self, event: CouncilEvent) {
        if let Some(line) = Self::line(&event) {
            eprintln!("{}", line);
        }
    }
}
