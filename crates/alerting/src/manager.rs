//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::AlertKind;

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum time between notifications of the same kind (seconds)
    pub cooldown_secs: f64,
    /// Per-kind cooldown overrides (seconds)
    pub cooldown_overrides: HashMap<AlertKind, f64>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 1.0,
            cooldown_overrides: HashMap::new(),
        }
    }
}

impl AlertConfig {
    /// Effective cooldown for one kind
    pub fn cooldown(&self, kind: AlertKind) -> Duration {
        let secs = self
            .cooldown_overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.cooldown_secs);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

/// Notification record of one alert kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertState {
    /// Last time this alert was notified
    pub last_notified: Duration,
    /// Number of times notified
    pub notify_count: usize,
}

/// Per-kind cooldown gate for outward notifications
pub struct AlertManager {
    /// Configuration
    config: AlertConfig,
    /// Notification records by kind
    states: HashMap<AlertKind, AlertState>,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            states: HashMap::new(),
        }
    }

    /// Check whether an active alert may be notified at `now`
    pub fn should_notify(&self, kind: AlertKind, now: Duration) -> bool {
        match self.states.get(&kind) {
            None => true,
            Some(state) => {
                let since = now.saturating_sub(state.last_notified);
                if since < self.config.cooldown(kind) {
                    debug!("Alert {} suppressed: in cooldown ({:?} since last)", kind, since);
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Record that a notification was sent
    pub fn record_notification(&mut self, kind: AlertKind, now: Duration) {
        let state = self.states.entry(kind).or_insert(AlertState {
            last_notified: now,
            notify_count: 0,
        });

        state.last_notified = now;
        state.notify_count += 1;

        debug!("Alert notified: {} (count: {})", kind, state.notify_count);
    }

    /// Gate and record in one step; returns whether the notification fires
    pub fn try_notify(&mut self, kind: AlertKind, now: Duration) -> bool {
        if self.should_notify(kind, now) {
            self.record_notification(kind, now);
            true
        } else {
            false
        }
    }

    pub fn state(&self, kind: AlertKind) -> Option<&AlertState> {
        self.states.get(&kind)
    }

    /// Notifications sent for one kind
    pub fn notify_count(&self, kind: AlertKind) -> usize {
        self.states.get(&kind).map_or(0, |s| s.notify_count)
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Clear all alert states
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
