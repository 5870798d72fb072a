//! Annomerge CLI
//!
//! Classifies, validates and merges video annotation files from the command
//! line. Results are printed to stdout as JSON; logs go to stderr and,
//! optionally, to a daily rolling file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use annomerge_core::{
    summarize, validate_with_threshold, AnnotationMerger, ClassifiedFile, FileClassifier,
    IngestSettings, InputFile, ValidationReport,
};

/// Command-line arguments for annomerge
#[derive(Parser, Debug)]
#[command(name = "annomerge")]
#[command(about = "Classify, validate and merge video annotation files")]
#[command(version)]
struct Cli {
    /// Settings file (JSON); defaults are used when omitted or missing
    #[arg(short, long, global = true, env = "ANNOMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true, env = "ANNOMERGE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify files, highest confidence first
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check that the files are enough for a merge (exits 1 if not)
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Group files into video, audio, pipelines and unknown
    Summarize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Merge files into one unified annotation record
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    let settings = match &cli.config {
        Some(path) => IngestSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => IngestSettings::default(),
    };

    match cli.command {
        Command::Classify { files } => {
            let classified = classify(&settings, &files).await?;
            print_json(&classified)?;
        }
        Command::Validate { files } => {
            let classified = classify(&settings, &files).await?;
            let report = validate_with_threshold(&classified, settings.low_confidence_threshold);
            print_json(&report)?;
            if !report.is_valid {
                warn!(missing = report.missing.len(), "Input set is not mergeable");
            }
            // Returning lets the log guard flush before the process exits
            return Ok(ExitCode::from(validation_status(&report)));
        }
        Command::Summarize { files } => {
            let classified = classify(&settings, &files).await?;
            print_json(&summarize(&classified))?;
        }
        Command::Merge { files, output } => {
            let classified = classify(&settings, &files).await?;
            let merger = AnnotationMerger::new(settings);

            let on_progress = |stage: &str, completed: usize, total: usize| {
                info!(completed, total, "{}", stage);
            };
            let outcome = merger
                .merge(&classified, Some(&on_progress))
                .await
                .context("Merge failed")?;

            if outcome.report.is_partial() {
                for warning in &outcome.report.warnings {
                    warn!("{}", warning);
                }
            }

            match output {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&outcome.record)?;
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Wrote unified annotation record");
                    print_json(&outcome.report)?;
                }
                None => print_json(&outcome.record)?,
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// Helpers
// =============================================================================

/// Logs to stderr, plus a rolling file when a directory is given
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "annomerge.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn classify(settings: &IngestSettings, paths: &[PathBuf]) -> Result<Vec<ClassifiedFile>> {
    let files = paths
        .iter()
        .map(|path| {
            InputFile::from_path(path).with_context(|| format!("Cannot open {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FileClassifier::new(settings.clone()).classify_all(&files).await)
}

/// Process status for `validate`: 0 when mergeable, 1 otherwise
fn validation_status(report: &ValidationReport) -> u8 {
    if report.is_valid {
        0
    } else {
        1
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
