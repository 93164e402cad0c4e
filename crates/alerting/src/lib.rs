//! Alerting System
//!
//! Provides the closed set of driver alert kinds, cooldown-gated notification
//! bookkeeping, and sinks that receive alert transitions.

mod kind;
mod manager;
mod sink;

pub use kind::{AlertEvent, AlertKind, DriverStatus};
pub use manager::{AlertConfig, AlertManager, AlertState};
pub use sink::{ChannelSink, LogSink, NotificationSink};
