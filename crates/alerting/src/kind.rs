//! Alert kinds and notification events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Driver alert kinds, declared in notification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// PERCLOS above threshold
    Drowsy,
    /// Mouth wide open
    Yawning,
    /// Looking away or head down for too long
    Distracted,
    /// Phone visible in the driver's hands
    PhoneDetected,
}

impl AlertKind {
    /// Every kind in priority order
    pub const ALL: [AlertKind; 4] = [
        AlertKind::Drowsy,
        AlertKind::Yawning,
        AlertKind::Distracted,
        AlertKind::PhoneDetected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Drowsy => "drowsy",
            AlertKind::Yawning => "yawning",
            AlertKind::Distracted => "distracted",
            AlertKind::PhoneDetected => "phone_detected",
        }
    }

    /// Spoken/HUD message for this alert
    pub fn message(self) -> &'static str {
        match self {
            AlertKind::Drowsy => "Drowsiness detected. Please rest.",
            AlertKind::Yawning => "You are yawning. Take a short break.",
            AlertKind::Distracted => "Please look at the road.",
            AlertKind::PhoneDetected => "Put the phone down. Eyes on the road.",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headline driver status for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    #[default]
    Normal,
    Alert(AlertKind),
}

impl DriverStatus {
    /// Status from a priority-ordered set of active kinds
    pub fn from_active(active: &[AlertKind]) -> Self {
        active
            .iter()
            .min()
            .map_or(DriverStatus::Normal, |&kind| DriverStatus::Alert(kind))
    }
}

/// Alert transition delivered to a notification sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    /// `true` on activation and cooldown reminders, `false` when the alert clears
    pub activated: bool,
    /// Session-relative time of the frame that produced the event
    pub timestamp: Duration,
}
