//! Driver Monitoring Replay - Main Entry Point

use alerting::LogSink;
use anyhow::{Context, Result};
use clap::Parser;
use monitor::{init_logging, replay, Settings};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a recorded landmark session through the driver monitor", long_about = None)]
struct Args {
    /// Recorded session (JSON lines)
    #[arg(short, long)]
    input: PathBuf,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Eye aspect ratio threshold
    #[arg(long)]
    ear_thresh: Option<f64>,

    /// PERCLOS ratio threshold
    #[arg(long)]
    perclos_thresh: Option<f64>,

    /// Continuous look-away time before distraction (seconds)
    #[arg(long)]
    gaze_secs: Option<f64>,

    /// Notification cooldown (seconds)
    #[arg(long)]
    cooldown_secs: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level, args.log_json)?;

    info!("=== Driver Monitor Replay v{} ===", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(v) = args.ear_thresh {
        settings.tracker.ear_thresh = v;
    }
    if let Some(v) = args.perclos_thresh {
        settings.tracker.perclos_thresh = v;
    }
    if let Some(v) = args.gaze_secs {
        settings.tracker.gaze_secs = v;
    }
    if let Some(v) = args.cooldown_secs {
        settings.fusion.alerts.cooldown_secs = v;
    }
    settings.validate().context("validating command-line overrides")?;

    let file = File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let stats = replay::run(BufReader::new(file), &settings, LogSink)
        .with_context(|| format!("replaying {}", args.input.display()))?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
