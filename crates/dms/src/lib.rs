//! Driver Monitoring System (DMS)
//!
//! Per-frame driver state analysis from facial landmarks:
//! - Eye and mouth aspect ratios
//! - Head pose from an external perspective-n-point solver
//! - PERCLOS and yawn detection
//! - Gaze-away and head-down timers

pub mod config;
pub mod landmarks;
pub mod metrics;
pub mod pose;
pub mod tracker;

pub use config::{EyeClosureRule, TrackerConfig};
pub use landmarks::{LandmarkFrame, LandmarkProvider, NoFaceDetected, Point3, LEFT_EYE, MOUTH, POSE_LANDMARKS, RIGHT_EYE};
pub use metrics::{MetricExtractor, Metrics};
pub use pose::{CameraIntrinsics, FaceModel, HeadPose, ImagePoint, PoseSolver, RigidTransform, SolverFailure};
pub use tracker::{SignalSet, TemporalTracker, Timer, TrackerSnapshot};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Landmark {index} missing (frame has {available} points)")]
    InvalidLandmarkSet { index: usize, available: usize },

    #[error("Invalid rotation matrix: {0}")]
    InvalidRotation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
