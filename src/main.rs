//! track-extract
//!
//! Extracts audio tracks, or single channels of them, from video files
//! using ffmpeg. Lossless stream copy is tried first; anything that cannot
//! be copied is reencoded.

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use track_extract::cli::Args;
use track_extract::config::{ExtractConfig, LogFormat};
use track_extract::config_file::{generate_default_config, ConfigFile};
use track_extract::discover::expand_inputs;
use track_extract::engine::{FfmpegEngine, TranscodeEngine};
use track_extract::probe::{FfprobeProbe, ProbeService};
use track_extract::report::ExtractionReport;
use track_extract::strategy::TaskOutcome;
use track_extract::{run_extraction, BatchSummary, ExtractError, Result};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "track-extract";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(e) = args.validate() {
        eprintln!("error: {}", e);
        std::process::exit(2);
    }

    if let Some(path) = &args.init_config {
        generate_default_config(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ConfigFile::from_file(path)?.into_extract_config(),
        None => ExtractConfig::default(),
    };
    args.apply(&mut config);

    init_logging(&config);
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::debug!("Configuration: {:?}", config);

    let containers = expand_inputs(&args.inputs)?;
    if containers.is_empty() {
        tracing::warn!("Nothing to do: no video files found");
        return Ok(());
    }

    let probe = select_probe(&config)?;
    let engine: Arc<dyn TranscodeEngine> = Arc::new(FfmpegEngine::new(&config.tools.ffmpeg));

    let reports = run_extraction(
        &containers,
        config.extraction.output_dir.as_deref(),
        &config.plan_options(),
        config.extraction.max_workers,
        probe,
        engine,
    )
    .await;

    let summary = BatchSummary::from_reports(&reports);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
        println!(
            "Done: {} copied, {} reencoded, {} skipped, {} failed across {} file(s)",
            summary.outcomes.copied,
            summary.outcomes.reencoded,
            summary.outcomes.skipped,
            summary.outcomes.failed,
            summary.containers
        );
    }

    std::process::exit(summary.exit_code());
}

/// Probe Service for the configured backend
fn select_probe(config: &ExtractConfig) -> Result<Arc<dyn ProbeService>> {
    if config.tools.in_process_probe {
        #[cfg(feature = "libav")]
        {
            let probe = track_extract::probe::LibavProbe::new()
                .map_err(|e| ExtractError::Config(e.to_string()))?;
            return Ok(Arc::new(probe));
        }
        #[cfg(not(feature = "libav"))]
        return Err(ExtractError::Config(
            "in_process_probe requires building with the libav feature".to_string(),
        ));
    }
    Ok(Arc::new(FfprobeProbe::new(&config.tools.ffprobe)))
}

/// Initialize logging with tracing. Logs go to stderr so stdout only
/// carries the report.
fn init_logging(config: &ExtractConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter().into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_report(report: &ExtractionReport) {
    println!("{}", report.container_path.display());
    if let Some(error) = &report.error {
        println!("  error: {}", error);
        return;
    }
    for entry in &report.entries {
        let task = &entry.task;
        let target = match task.channel_index {
            Some(ch) => format!("track {} channel {}", task.track_index, ch),
            None => format!("track {}", task.track_index),
        };
        let line = match &entry.outcome {
            TaskOutcome::SucceededViaCopy { path } => format!("copied -> {}", path.display()),
            TaskOutcome::SucceededViaReencode { path, encoder } => {
                format!("reencoded ({}) -> {}", encoder, path.display())
            }
            TaskOutcome::Skipped { .. } => {
                format!("skipped, {} exists", task.output_path.display())
            }
            TaskOutcome::Failed { diagnostic } => format!("failed: {}", diagnostic),
        };
        println!("  {}: {}", target, line);
    }
}
