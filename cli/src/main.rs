//! CLI entrypoint for council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{CompositeEventSink, CouncilOutput, EventSink, StepEngine};
use council_infrastructure::{
    ConfigLoader, CouncilFactory, FileConfig, FileWorkerConfig, JsonlEventSink,
};
use council_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize logging based on verbosity level.
///
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(verbose: u8, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    for definition in &cli.workers {
        let Some(worker) = FileWorkerConfig::parse_definition(definition) else {
            bail!("Invalid worker definition '{}', expected NAME=COMMAND", definition);
        };
        config.upsert_worker(worker);
    }
    Ok(config)
}

async fn read_task(cli: &Cli) -> Result<String> {
    if let Some(task) = &cli.task {
        return Ok(task.clone());
    }
    if std::io::stdin().is_terminal() {
        bail!("Task is required: pass it as an argument or pipe it on stdin.");
    }

    let mut task = String::new();
    tokio::io::stdin()
        .read_to_string(&mut task)
        .await
        .context("Failed to read task from stdin")?;
    if task.trim().is_empty() {
        bail!("Task read from stdin is empty.");
    }
    Ok(task)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_ref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    info!("Starting council");

    let config = load_config(&cli)?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    let format = match (cli.output, config.output.format.as_deref()) {
        (Some(format), _) => format,
        (None, Some(configured)) => configured
            .parse::<OutputFormat>()
            .map_err(anyhow::Error::msg)?,
        (None, None) => OutputFormat::Final,
    };

    // === Dependency Injection ===
    let mut events = CompositeEventSink::default();
    if !cli.quiet && format != OutputFormat::Json {
        events.push(Arc::new(ProgressReporter::new()));
    }
    let events_path = cli
        .events
        .clone()
        .or_else(|| config.output.events.as_ref().map(PathBuf::from));
    if let Some(path) = events_path {
        match JsonlEventSink::new(&path) {
            Some(sink) => events.push(Arc::new(sink)),
            None => warn!("Event log disabled: could not open {}", path.display()),
        }
    }
    let events: Arc<dyn EventSink> = Arc::new(events);

    let cancellation = CancellationToken::new();
    let council = CouncilFactory::new(&config)?
        .build()?
        .with_engine(StepEngine::new().with_events(events))
        .with_cancellation(cancellation.clone());

    let task = read_task(&cli).await?;

    tokio::spawn({
        let cancellation = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling council run");
                cancellation.cancel();
            }
        }
    });

    let output = match council.execute(&task).await {
        Ok(output) => output,
        Err(error) => {
            // Steps finished before the abort stay visible; later step indices are absent.
            if let Some(partial) = error.partial()
                && !partial.results.is_empty()
            {
                match format {
                    OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(partial)),
                    _ => eprintln!("{}", ConsoleFormatter::format(partial)),
                }
            }
            return Err(error)
                .with_context(|| format!("Council {} did not complete", council.name()));
        }
    };

    println!("{}", render(format, &output));

    Ok(())
}

fn render(format: OutputFormat, output: &CouncilOutput) -> String {
    match format {
        OutputFormat::Full => ConsoleFormatter::format(output),
        OutputFormat::Final => ConsoleFormatter::format_final_only(output),
        OutputFormat::Json => ConsoleFormatter::format_json(output),
    }
}
