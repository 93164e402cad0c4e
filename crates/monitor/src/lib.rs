//! Driver Monitor
//!
//! Wires the per-frame pipeline together: landmarks go through metric
//! extraction and temporal tracking, get fused with the latest secondary
//! detection, and alert transitions go out to a notification sink. Also
//! carries settings loading, logging setup, and recorded-session replay.

mod fps;
mod pipeline;
pub mod replay;
mod settings;

pub use fps::FpsMeter;
pub use pipeline::{DriverMonitor, FrameReport, SessionStats};
pub use settings::{CameraConfig, Settings, SettingsError};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: Level, json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
