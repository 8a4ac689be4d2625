//! Pulseboard CLI
//!
//! Command-line interface for the Pulseboard PR-dashboard pipeline.
//! Reads a detector report (JSON), runs the limit engine and renderer,
//! and writes a ready-to-import Grafana dashboard.
//!
//! # Usage
//!
//! ```bash
//! pulseboard generate --input report.json --output dashboard.json
//! pulseboard generate --input report.json --strict
//! pulseboard validate --input report.json
//! ```

#![deny(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use validator::Validate;

use shared::limits::{total_panel_weight, LimitEngine, LimitMode};
use shared::models::DetectorReport;
use shared::pipeline::DashboardPipeline;

/// Pulseboard CLI - PR dashboards from detected observability signals
#[derive(Parser)]
#[command(name = "pulseboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dashboard from a detector report
    Generate {
        /// Path to the detector report JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the dashboard JSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the vendor-neutral query bundle here
        #[arg(long)]
        bundle: Option<PathBuf>,

        /// Fail instead of truncating when a limit is exceeded
        #[arg(long)]
        strict: bool,

        /// Start of the dashboard time range (e.g. now-1h)
        #[arg(long, env = "PULSEBOARD_TIME_FROM")]
        from: Option<String>,

        /// End of the dashboard time range (e.g. now)
        #[arg(long, env = "PULSEBOARD_TIME_TO")]
        to: Option<String>,
    },
    /// Check a detector report against the limit policy
    Validate {
        /// Path to the detector report JSON
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            bundle,
            strict,
            from,
            to,
        } => generate(
            &input,
            output.as_deref(),
            bundle.as_deref(),
            strict,
            from,
            to,
        ),
        Commands::Validate { input } => validate(&input),
    }
}

/// Loads and deserializes a detector report.
///
/// Validation failures are logged but do not abort: a partially valid
/// report still yields a partially informative dashboard.
fn load_report(path: &Path) -> Result<DetectorReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read detector report '{}'", path.display()))?;
    let report: DetectorReport = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse detector report '{}'", path.display()))?;

    if let Err(errors) = report.validate() {
        tracing::warn!(%errors, "Detector report failed validation, continuing");
    }

    Ok(report)
}

fn generate(
    input: &Path,
    output: Option<&Path>,
    bundle_path: Option<&Path>,
    strict: bool,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let mut report = load_report(input)?;

    if from.is_some() || to.is_some() {
        let mut range = report.time_range.take().unwrap_or_default();
        if let Some(from) = from {
            range.from = from;
        }
        if let Some(to) = to {
            range.to = to;
        }
        report.time_range = Some(range);
    }

    let mode = if strict {
        LimitMode::Strict
    } else {
        LimitMode::Lenient
    };

    let result = match DashboardPipeline::grafana(mode).run_report(report) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    };

    if let Some(path) = bundle_path {
        let json = serde_json::to_string_pretty(&result.bundle)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write bundle '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote query bundle");
    }

    let json = serde_json::to_string_pretty(&result.dashboard)?;
    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write dashboard '{}'", path.display()))?;
            tracing::info!(
                path = %path.display(),
                panels = result.dashboard.panels.len(),
                "Wrote dashboard"
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn validate(input: &Path) -> Result<()> {
    let report = load_report(input)?;
    let engine = LimitEngine::new(LimitMode::Strict);

    match engine.truncate_and_validate(report.signals) {
        Ok(result) => {
            println!(
                "Report within limits: {} signals, {} panels",
                result.signals.len(),
                total_panel_weight(&result.signals)
            );
            Ok(())
        }
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}
