//! Notification sinks
//!
//! Sinks must return immediately: speech, HUD rendering and any backoff live
//! behind the sink, never on the frame loop.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::AlertEvent;

/// Receives alert transitions from the fusion stage
pub trait NotificationSink {
    fn notify(&mut self, event: &AlertEvent);
}

impl<S: NotificationSink + ?Sized> NotificationSink for Box<S> {
    fn notify(&mut self, event: &AlertEvent) {
        (**self).notify(event)
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn notify(&mut self, event: &AlertEvent) {
        (**self).notify(event)
    }
}

/// Collects events in memory
impl NotificationSink for Vec<AlertEvent> {
    fn notify(&mut self, event: &AlertEvent) {
        self.push(*event);
    }
}

/// Writes alert transitions to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, event: &AlertEvent) {
        if event.activated {
            warn!(
                kind = event.kind.as_str(),
                at_ms = event.timestamp.as_millis() as u64,
                "{}",
                event.kind.message()
            );
        } else {
            info!(
                kind = event.kind.as_str(),
                at_ms = event.timestamp.as_millis() as u64,
                "Alert cleared"
            );
        }
    }
}

/// Forwards events to an async consumer (speech, HUD) without blocking
pub struct ChannelSink {
    tx: mpsc::Sender<AlertEvent>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<AlertEvent>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Create a sink together with its receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AlertEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Events discarded because the consumer was behind or gone
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&mut self, event: &AlertEvent) {
        match self.tx.try_send(*event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.dropped += 1;
                warn!("Notification consumer is behind, dropping {} event", event.kind);
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.dropped += 1;
                debug!("Notification consumer closed, dropping {} event", event.kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertKind;
    use std::time::Duration;

    fn event(kind: AlertKind) -> AlertEvent {
        AlertEvent {
            kind,
            activated: true,
            timestamp: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (mut sink, mut rx) = ChannelSink::channel(4);
        sink.notify(&event(AlertKind::Drowsy));
        sink.notify(&event(AlertKind::PhoneDetected));

        assert_eq!(rx.recv().await.unwrap().kind, AlertKind::Drowsy);
        assert_eq!(rx.recv().await.unwrap().kind, AlertKind::PhoneDetected);
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_channel_sink_never_blocks_when_full() {
        let (mut sink, _rx) = ChannelSink::channel(1);
        sink.notify(&event(AlertKind::Drowsy));
        sink.notify(&event(AlertKind::Yawning));
        sink.notify(&event(AlertKind::Distracted));
        assert_eq!(sink.dropped(), 2);
    }

    #[test]
    fn test_channel_sink_closed_consumer() {
        let (mut sink, rx) = ChannelSink::channel(4);
        drop(rx);
        sink.notify(&event(AlertKind::Drowsy));
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn test_boxed_sink() {
        let mut sink: Box<dyn NotificationSink> = Box::new(LogSink);
        sink.notify(&event(AlertKind::Yawning));

        let mut collected: Box<Vec<AlertEvent>> = Box::default();
        collected.notify(&event(AlertKind::Yawning));
        assert_eq!(collected.len(), 1);
    }
}
