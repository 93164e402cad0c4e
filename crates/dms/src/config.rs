//! Temporal tracker configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DmsError;

/// How the two eye aspect ratios combine into one "eyes closed" sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeClosureRule {
    /// Both eyes below threshold
    #[default]
    Both,
    /// Either eye below threshold
    Either,
    /// Mean of both eyes below threshold
    Mean,
}

impl EyeClosureRule {
    pub fn is_closed(self, ear_left: f64, ear_right: f64, threshold: f64) -> bool {
        match self {
            EyeClosureRule::Both => ear_left < threshold && ear_right < threshold,
            EyeClosureRule::Either => ear_left < threshold || ear_right < threshold,
            EyeClosureRule::Mean => (ear_left + ear_right) / 2.0 < threshold,
        }
    }
}

/// Thresholds and window sizes for the temporal tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Eye aspect ratio below which an eye counts as closed
    pub ear_thresh: f64,

    /// How left and right eye combine
    pub eye_rule: EyeClosureRule,

    /// PERCLOS window length (frames)
    pub perclos_window: usize,

    /// PERCLOS ratio above which the driver is drowsy
    pub perclos_thresh: f64,

    /// Mouth aspect ratio above which the driver is yawning
    pub mar_yawn_thresh: f64,

    /// Continuous gaze-away time before distraction (seconds)
    pub gaze_secs: f64,

    /// Continuous head-down time before distraction (seconds, defaults to `gaze_secs`)
    pub head_down_secs: Option<f64>,

    /// Absolute yaw beyond which the driver looks away (degrees)
    pub yaw_abs_thresh_deg: f64,

    /// Pitch beyond which the head is down (degrees)
    pub down_pitch_thresh_deg: f64,

    /// Window length for yaw/pitch ratios (frames)
    pub pose_window: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ear_thresh: 0.23,
            eye_rule: EyeClosureRule::Both,
            perclos_window: 120,
            perclos_thresh: 0.35,
            mar_yawn_thresh: 0.65,
            gaze_secs: 1.0,
            head_down_secs: None,
            yaw_abs_thresh_deg: 25.0,
            down_pitch_thresh_deg: 18.0,
            pose_window: 30,
        }
    }
}

impl TrackerConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            perclos_thresh: 0.25,
            gaze_secs: 0.75,
            yaw_abs_thresh_deg: 20.0,
            down_pitch_thresh_deg: 15.0,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            perclos_thresh: 0.45,
            gaze_secs: 2.0,
            yaw_abs_thresh_deg: 35.0,
            down_pitch_thresh_deg: 25.0,
            ..Default::default()
        }
    }

    pub fn gaze_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.gaze_secs).unwrap_or(Duration::ZERO)
    }

    pub fn head_down_duration(&self) -> Duration {
        let secs = self.head_down_secs.unwrap_or(self.gaze_secs);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// Reject values the tracker cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.perclos_window == 0 {
            return Err(DmsError::Config("perclos_window must be at least 1".into()));
        }
        if self.pose_window == 0 {
            return Err(DmsError::Config("pose_window must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.perclos_thresh) {
            return Err(DmsError::Config(format!(
                "perclos_thresh {} outside [0, 1]",
                self.perclos_thresh
            )));
        }
        let thresholds = [
            ("ear_thresh", self.ear_thresh),
            ("mar_yawn_thresh", self.mar_yawn_thresh),
            ("yaw_abs_thresh_deg", self.yaw_abs_thresh_deg),
            ("down_pitch_thresh_deg", self.down_pitch_thresh_deg),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(DmsError::Config(format!("{} must be a finite number", name)));
            }
        }
        if self.yaw_abs_thresh_deg < 0.0 || self.down_pitch_thresh_deg < 0.0 {
            return Err(DmsError::Config("angle thresholds must be non-negative".into()));
        }
        let durations = [("gaze_secs", Some(self.gaze_secs)), ("head_down_secs", self.head_down_secs)];
        for (name, secs) in durations {
            if let Some(secs) = secs {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(DmsError::Config(format!("{} must be a non-negative number", name)));
                }
            }
        }
        Ok(())
    }
}
