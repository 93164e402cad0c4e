//! Event Fusion Engine
//!
//! Combines the per-frame signals from the temporal tracker with the latest
//! secondary detection into named alert states:
//! - Drowsy (PERCLOS)
//! - Yawning (mouth aspect ratio)
//! - Distracted (gaze away or head down)
//! - PhoneDetected (secondary detector)
//!
//! Each kind switches between inactive and active independently. Activations
//! are gated by a per-kind cooldown; deactivations always go out.

use alerting::{AlertConfig, AlertEvent, AlertKind, AlertManager, DriverStatus};
use detector_scheduler::DetectionResult;
use dms::SignalSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Fusion error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("Phone confidence threshold {0} outside [0, 1]")]
    InvalidConfidence(f32),

    #[error("Negative cooldown for {kind}: {secs}s")]
    InvalidCooldown { kind: AlertKind, secs: f64 },
}

/// Fusion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Minimum box confidence that counts as a phone in use
    pub phone_min_confidence: f32,
    /// Notification cooldowns
    pub alerts: AlertConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            phone_min_confidence: 0.35,
            alerts: AlertConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), FusionError> {
        if !(0.0..=1.0).contains(&self.phone_min_confidence) {
            return Err(FusionError::InvalidConfidence(self.phone_min_confidence));
        }
        for kind in AlertKind::ALL {
            let secs = self
                .alerts
                .cooldown_overrides
                .get(&kind)
                .copied()
                .unwrap_or(self.alerts.cooldown_secs);
            if !secs.is_finite() || secs < 0.0 {
                return Err(FusionError::InvalidCooldown { kind, secs });
            }
        }
        Ok(())
    }
}

/// Result of fusing one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionOutcome {
    /// Active kinds in priority order
    pub active: Vec<AlertKind>,
    /// Transitions and reminders to deliver, in priority order
    pub events: Vec<AlertEvent>,
    /// Highest-priority active kind
    pub status: DriverStatus,
}

/// Per-session alert state machine
pub struct AlertFusion {
    phone_min_confidence: f32,
    active: BTreeSet<AlertKind>,
    notifier: AlertManager,
}

impl AlertFusion {
    /// Create new fusion engine
    pub fn new(config: FusionConfig) -> Self {
        info!(
            "Creating alert fusion: phone_min_confidence={}",
            config.phone_min_confidence
        );
        Self {
            phone_min_confidence: config.phone_min_confidence,
            active: BTreeSet::new(),
            notifier: AlertManager::new(config.alerts),
        }
    }

    /// Fuse one frame.
    ///
    /// Without a signal set (no face, bad landmarks) nothing changes and no
    /// events are produced.
    pub fn fuse(
        &mut self,
        signals: Option<&SignalSet>,
        detection: Option<&DetectionResult>,
        now: Duration,
    ) -> FusionOutcome {
        let Some(signals) = signals else {
            return self.outcome(Vec::new());
        };

        let phone = detection.is_some_and(|d| d.any_above(self.phone_min_confidence));
        let mut events = Vec::new();

        for kind in AlertKind::ALL {
            let driving = match kind {
                AlertKind::Drowsy => signals.drowsy,
                AlertKind::Yawning => signals.yawning,
                AlertKind::Distracted => signals.distracted_by_gaze || signals.distracted_by_pitch,
                AlertKind::PhoneDetected => phone,
            };

            if driving {
                if self.active.insert(kind) {
                    debug!("Alert {} activated", kind);
                }
                if self.notifier.try_notify(kind, now) {
                    events.push(AlertEvent {
                        kind,
                        activated: true,
                        timestamp: now,
                    });
                }
            } else if self.active.remove(&kind) {
                debug!("Alert {} cleared", kind);
                events.push(AlertEvent {
                    kind,
                    activated: false,
                    timestamp: now,
                });
            }
        }

        self.outcome(events)
    }

    fn outcome(&self, events: Vec<AlertEvent>) -> FusionOutcome {
        let active: Vec<AlertKind> = self.active.iter().copied().collect();
        let status = DriverStatus::from_active(&active);
        FusionOutcome {
            active,
            events,
            status,
        }
    }

    pub fn is_active(&self, kind: AlertKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn status(&self) -> DriverStatus {
        DriverStatus::from_active(&self.active.iter().copied().collect::<Vec<_>>())
    }

    /// Notification bookkeeping (last notified, counts)
    pub fn notifier(&self) -> &AlertManager {
        &self.notifier
    }

    /// Forget active alerts and cooldowns (driver change)
    pub fn reset(&mut self) {
        self.active.clear();
        self.notifier.clear();
    }
}

impl Default for AlertFusion {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}
