//! Secondary Detector Scheduler
//!
//! Runs a slow object detector (e.g. phone-in-hand) at a fixed wall-clock
//! cadence next to the fast per-frame loop. Requests go out through a
//! single-slot mailbox and the newest completed result is published through a
//! single-slot `watch` channel, so the frame loop never waits on detection.

mod detection;
mod scheduler;
mod worker;

pub use detection::{BoundingBox, DetectionResult, ObjectDetector, PixelRect, RegionOfInterest};
pub use scheduler::{DetectionRequest, DetectorMailbox, DetectorScheduler, Dispatch, SchedulerConfig, SchedulerStats};
pub use worker::DetectorWorker;

use thiserror::Error;

/// Detector error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// The detector cannot run this session (missing model, missing runtime)
    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    /// A single detection call failed
    #[error("Detection failed: {0}")]
    Inference(String),
}

/// Scheduler configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid target rate {0} Hz")]
    InvalidRate(f64),

    #[error("Invalid region of interest: {0}")]
    InvalidRegion(String),
}
