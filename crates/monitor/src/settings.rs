//! Layered session settings
//!
//! Sources, lowest priority first: an optional settings file (TOML, YAML or
//! JSON by extension), then `DMS_` environment variables using `__` between
//! nesting levels (`DMS_TRACKER__EAR_THRESH=0.25`). Command-line overrides are
//! applied by the binary on top.

use config::{Config, Environment, File, FileFormat, FileSourceFile, Source};
use detector_scheduler::{SchedulerConfig, SchedulerError};
use dms::{CameraIntrinsics, DmsError, TrackerConfig};
use event_fusion::{FusionConfig, FusionError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Settings error types
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid tracker settings: {0}")]
    Tracker(#[from] DmsError),

    #[error("Invalid detector settings: {0}")]
    Detector(#[from] SchedulerError),

    #[error("Invalid fusion settings: {0}")]
    Fusion(#[from] FusionError),

    #[error("Invalid camera settings: {0}")]
    Camera(String),
}

/// Camera geometry and nominal frame rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    /// Calibrated intrinsics; derived from the frame size when absent
    pub intrinsics: Option<CameraIntrinsics>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            target_fps: 30,
            intrinsics: None,
        }
    }
}

impl CameraConfig {
    pub fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
            .unwrap_or_else(|| CameraIntrinsics::from_frame_size(self.width, self.height))
    }
}

/// Everything one monitoring session needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraConfig,
    pub tracker: TrackerConfig,
    pub detector: SchedulerConfig,
    pub fusion: FusionConfig,
    /// Consecutive face-less frames before the face counts as lost
    /// (defaults to two seconds at the target frame rate)
    pub no_face_frames: Option<usize>,
}

impl Settings {
    /// Load from an optional file and the process environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = path {
            info!("Loading settings from {}", path.display());
        }
        let file = path.map(File::<FileSourceFile, FileFormat>::from);
        Self::from_sources(file, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("DMS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_sources<S>(file: Option<S>, env: Environment) -> Result<Self, SettingsError>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(file);
        }
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(SettingsError::Camera(format!(
                "frame size {}x{} must be non-zero",
                self.camera.width, self.camera.height
            )));
        }
        if self.camera.target_fps == 0 {
            return Err(SettingsError::Camera("target_fps must be at least 1".into()));
        }
        if self.no_face_frames == Some(0) {
            return Err(SettingsError::Camera("no_face_frames must be at least 1".into()));
        }
        self.tracker.validate()?;
        self.detector.validate()?;
        self.fusion.validate()?;
        Ok(())
    }

    /// Face-less frames before the face is reported lost
    pub fn no_face_threshold(&self) -> usize {
        self.no_face_frames
            .unwrap_or(self.camera.target_fps.max(1) as usize * 2)
    }
}
