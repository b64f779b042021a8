//! Vigil - Security telemetry pipeline
//!
//! # Usage
//!
//! ```bash
//! # Run the pipeline (default)
//! vigil
//! vigil run --config /etc/vigil/pipeline.toml
//!
//! # Parse, validate and dry-resolve without starting anything
//! vigil check --config /etc/vigil/pipeline.toml
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};
use vigil_config::{Config, LogConfig, LogFormat, LogOutput};

/// Vigil - Security telemetry pipeline
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the pipeline configuration file
    #[arg(short, long, default_value = "vigil.toml", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log] level
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and run the pipeline until its input ends or a signal arrives
    Run,

    /// Validate the configuration and resolve every stage and channel
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_logging(&config.log, cli.log_level.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd::run::run(config).await,
        Command::Check => cmd::check::run(&config),
    }
}

/// Initialize the tracing subscriber from `[log]`
///
/// Diagnostics go to stderr unless configured otherwise, keeping stdout
/// free for the stdout sink.
fn init_logging(log: &LogConfig, level: Option<&str>) -> Result<()> {
    let filter = log_filter(log, level)?;

    let writer = match log.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let layer = match log.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}

/// Parse the effective filter; a bad `--log-level` is an error, not a fallback
fn log_filter(log: &LogConfig, level: Option<&str>) -> Result<EnvFilter> {
    let directive = log.directive(level);
    EnvFilter::try_new(&directive)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", directive, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_accepts_levels_and_targets() {
        let mut log = LogConfig::default();
        assert!(log_filter(&log, None).is_ok());
        assert!(log_filter(&log, Some("debug")).is_ok());
        assert!(log_filter(&log, Some("warn,vigil_pipeline=trace")).is_ok());

        log.targets
            .insert("vigil_exporter".into(), vigil_config::LogLevel::Debug);
        assert!(log_filter(&log, Some("error")).is_ok());
    }

    #[test]
    fn test_log_filter_rejects_bad_level() {
        let log = LogConfig::default();
        let err = log_filter(&log, Some("vigil=loudest")).unwrap_err();
        assert!(err.to_string().contains("invalid log filter 'vigil=loudest'"));
    }
}
