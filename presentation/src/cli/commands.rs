//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every step with its metadata
    Full,
    /// Only the output of the last step
    Final,
    /// JSON output
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| format!("Unknown output format: {}. Valid: full, final, json", s))
    }
}

/// CLI arguments for council
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about = "Council - run a task through debating and fanned-out workers")]
#[command(long_about = r#"
Council runs a task through a pipeline of steps executed by a set of workers.

Workers are shell commands: the task text is written to stdin and stdout is
the answer. Steps are either:
  debate   Workers propose, revise over several rounds, then vote on a winner
  fan_out  The task is split into one subtask per worker and the outputs combined

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/council/config.toml   Global config

Example:
  council -w a='llm -m gpt-5' -w b='llm -m claude' "Review this design"
  git diff | council --config review.toml -o json
"#)]
pub struct Cli {
    /// The task to run (read from stdin when omitted)
    pub task: Option<String>,

    /// Add a worker as NAME=COMMAND (can be specified multiple times)
    #[arg(short, long = "worker", value_name = "NAME=COMMAND")]
    pub workers: Vec<String>,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write lifecycle events as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers_and_flags() {
        let cli = Cli::parse_from([
            "council",
            "-w",
            "a=cat",
            "--worker",
            "b=tr a-z A-Z",
            "-o",
            "json",
            "-vv",
            "Review the plan",
        ]);

        assert_eq!(cli.task.as_deref(), Some("Review the plan"));
        assert_eq!(cli.workers, vec!["a=cat", "b=tr a-z A-Z"]);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_output_format_from_config_string() {
        assert_eq!("FINAL".parse::<OutputFormat>(), Ok(OutputFormat::Final));
        assert!("synthesis".parse::<OutputFormat>().is_err());
    }
}
