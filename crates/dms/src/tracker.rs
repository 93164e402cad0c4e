//! Driver state tracking over time

use ring_buffer::FlagWindow;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::metrics::Metrics;

/// Measures how long a condition has held continuously
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    started_at: Option<Duration>,
}

impl Timer {
    /// Start on the first frame the condition holds, reset the instant it clears
    pub fn track(&mut self, condition: bool, now: Duration) {
        match (condition, self.started_at) {
            (true, None) => self.started_at = Some(now),
            (false, Some(_)) => self.started_at = None,
            _ => {}
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since the condition started holding, if it currently holds
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.started_at.map(|start| now.saturating_sub(start))
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

/// Debounced boolean signals for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    /// PERCLOS above threshold
    pub drowsy: bool,
    /// Mouth open beyond the yawn threshold this frame
    pub yawning: bool,
    /// Looking sideways for longer than allowed
    pub distracted_by_gaze: bool,
    /// Head down for longer than allowed
    pub distracted_by_pitch: bool,
}

/// Smoothed values behind the current signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Closed-eye ratio over the PERCLOS window
    pub perclos: f64,
    /// Closed-eye frames in the PERCLOS window
    pub closed_frames: usize,
    /// Share of the pose window spent looking sideways
    pub yaw_away_ratio: f64,
    /// Share of the pose window spent with the head down
    pub pitch_down_ratio: f64,
    /// How long the driver has been looking away
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_away_for: Option<Duration>,
    /// How long the head has been down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_down_for: Option<Duration>,
}

/// Per-session temporal tracker.
///
/// Frames without a head pose add no yaw/pitch samples and leave the timers
/// untouched; a running timer keeps counting against the frame timestamp.
pub struct TemporalTracker {
    config: TrackerConfig,
    eyes_closed: FlagWindow,
    yaw_away: FlagWindow,
    pitch_down: FlagWindow,
    gaze_timer: Timer,
    head_down_timer: Timer,
    last_timestamp: Option<Duration>,
}

impl TemporalTracker {
    pub fn new(config: TrackerConfig) -> Self {
        info!(
            "Creating temporal tracker: perclos_window={}, perclos_thresh={}, gaze_secs={}",
            config.perclos_window, config.perclos_thresh, config.gaze_secs
        );
        Self {
            eyes_closed: FlagWindow::new(config.perclos_window),
            yaw_away: FlagWindow::new(config.pose_window),
            pitch_down: FlagWindow::new(config.pose_window),
            gaze_timer: Timer::default(),
            head_down_timer: Timer::default(),
            last_timestamp: None,
            config,
        }
    }

    /// Feed one frame of metrics and derive the current signals
    pub fn update(&mut self, metrics: &Metrics) -> SignalSet {
        let now = metrics.timestamp;
        self.last_timestamp = Some(now);

        let closed = self
            .config
            .eye_rule
            .is_closed(metrics.ear_left, metrics.ear_right, self.config.ear_thresh);
        self.eyes_closed.push(closed);

        if let Some(pose) = &metrics.head_pose {
            let looking_away = pose.yaw.abs() > self.config.yaw_abs_thresh_deg;
            let head_down = pose.pitch > self.config.down_pitch_thresh_deg;

            self.yaw_away.push(looking_away);
            self.pitch_down.push(head_down);
            self.gaze_timer.track(looking_away, now);
            self.head_down_timer.track(head_down, now);
        }

        let signals = SignalSet {
            drowsy: self.perclos() > self.config.perclos_thresh,
            yawning: metrics.mar > self.config.mar_yawn_thresh,
            distracted_by_gaze: self
                .gaze_timer
                .elapsed(now)
                .is_some_and(|held| held >= self.config.gaze_duration()),
            distracted_by_pitch: self
                .head_down_timer
                .elapsed(now)
                .is_some_and(|held| held >= self.config.head_down_duration()),
        };

        debug!(
            "Tracker update at {:?}: perclos={:.3}, mar={:.3}, signals={:?}",
            now,
            self.perclos(),
            metrics.mar,
            signals
        );

        signals
    }

    /// Closed-eye ratio over the full PERCLOS window
    pub fn perclos(&self) -> f64 {
        self.eyes_closed.ratio()
    }

    /// Smoothed values as of the last update
    pub fn snapshot(&self) -> TrackerSnapshot {
        let now = self.last_timestamp.unwrap_or_default();
        TrackerSnapshot {
            perclos: self.perclos(),
            closed_frames: self.eyes_closed.count(),
            yaw_away_ratio: self.yaw_away.ratio(),
            pitch_down_ratio: self.pitch_down.ratio(),
            gaze_away_for: self.gaze_timer.elapsed(now),
            head_down_for: self.head_down_timer.elapsed(now),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Reset state (on driver change)
    pub fn reset(&mut self) {
        self.eyes_closed.clear();
        self.yaw_away.clear();
        self.pitch_down.clear();
        self.gaze_timer.reset();
        self.head_down_timer.reset();
        self.last_timestamp = None;
    }
}
