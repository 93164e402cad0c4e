//! Detector Scheduler Implementation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::detection::{DetectionResult, ObjectDetector, RegionOfInterest};
use crate::worker::DetectorWorker;
use crate::{DetectorError, SchedulerError};

/// Configuration for the detector scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether the secondary detector should be loaded at all
    pub enabled: bool,
    /// Detection cadence in Hz (default: 2.0)
    pub target_rate_hz: f64,
    /// Frame region handed to the detector
    pub region: RegionOfInterest,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_rate_hz: 2.0,
            region: RegionOfInterest::default(),
        }
    }
}

impl SchedulerConfig {
    /// Minimum time between two dispatches
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.target_rate_hz).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !self.target_rate_hz.is_finite() || self.target_rate_hz <= 0.0 {
            return Err(SchedulerError::InvalidRate(self.target_rate_hz));
        }
        self.region.validate()
    }
}

/// One detection job
#[derive(Debug, Clone)]
pub struct DetectionRequest<F> {
    pub frame: F,
    pub region: RegionOfInterest,
    pub timestamp: Duration,
    pub sequence: u64,
}

/// Outcome of one primary-loop tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Detection is off for this session
    Disabled,
    /// Not yet time for another detection
    Waiting,
    /// A request was handed to the worker
    Sent,
    /// The worker still had a pending request; this one was dropped
    Busy,
}

/// Dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub dispatched: u64,
    pub busy: u64,
}

/// Worker-side ends of the scheduler's two mailboxes
pub struct DetectorMailbox<F> {
    requests: mpsc::Receiver<DetectionRequest<F>>,
    results: watch::Sender<Option<Arc<DetectionResult>>>,
}

impl<F> DetectorMailbox<F> {
    /// Wait for the next request; `None` once the scheduler is gone
    pub async fn recv(&mut self) -> Option<DetectionRequest<F>> {
        self.requests.recv().await
    }

    /// Take a pending request without waiting
    pub fn try_recv(&mut self) -> Option<DetectionRequest<F>> {
        self.requests.try_recv().ok()
    }

    /// Replace the latest result; returns `false` once the scheduler is gone
    pub fn publish(&self, result: DetectionResult) -> bool {
        self.results.send(Some(Arc::new(result))).is_ok()
    }
}

struct DetectorLink<F> {
    requests: mpsc::Sender<DetectionRequest<F>>,
    latest: watch::Receiver<Option<Arc<DetectionResult>>>,
}

/// Time-multiplexes a slow detector against the primary frame loop.
///
/// The dispatch clock advances when a request is dispatched, not when it
/// completes, so a slow detector never causes a burst of catch-up requests.
pub struct DetectorScheduler<F> {
    period: Duration,
    region: RegionOfInterest,
    last_dispatch: Option<Duration>,
    link: Option<DetectorLink<F>>,
    stats: SchedulerStats,
}

impl<F: Clone + Send + 'static> DetectorScheduler<F> {
    /// Create a scheduler and the mailbox its worker reads from
    pub fn channel(config: &SchedulerConfig) -> (Self, DetectorMailbox<F>) {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (result_tx, result_rx) = watch::channel(None);

        info!(
            "Detector scheduler created: {} Hz, region {:?}",
            config.target_rate_hz, config.region
        );

        let scheduler = Self {
            period: config.period(),
            region: config.region,
            last_dispatch: None,
            link: Some(DetectorLink {
                requests: request_tx,
                latest: result_rx,
            }),
            stats: SchedulerStats::default(),
        };
        let mailbox = DetectorMailbox {
            requests: request_rx,
            results: result_tx,
        };
        (scheduler, mailbox)
    }

    /// A scheduler that never dispatches, for sessions without a detector
    pub fn disabled(config: &SchedulerConfig, reason: &DetectorError) -> Self {
        warn!("Secondary detection disabled for this session: {}", reason);
        Self {
            period: config.period(),
            region: config.region,
            last_dispatch: None,
            link: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Start a worker on the current tokio runtime for a freshly loaded
    /// detector. Detection stays off when the config disables it, when the
    /// detector failed to load, or when no runtime is available.
    pub fn spawn<D>(config: &SchedulerConfig, detector: Result<D, DetectorError>) -> Self
    where
        D: ObjectDetector<Frame = F>,
    {
        if !config.enabled {
            return Self::disabled(config, &DetectorError::Unavailable("disabled by configuration".into()));
        }
        let detector = match detector {
            Ok(detector) => detector,
            Err(e) => return Self::disabled(config, &e),
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                return Self::disabled(config, &DetectorError::Unavailable(format!("no async runtime: {}", e)));
            }
        };

        let (scheduler, mailbox) = Self::channel(config);
        runtime.spawn(DetectorWorker::new(detector, mailbox).run());
        scheduler
    }

    /// Called once per primary frame; dispatches when the cadence allows
    pub fn tick(&mut self, now: Duration, sequence: u64, frame: &F) -> Dispatch {
        if self.link.is_none() {
            return Dispatch::Disabled;
        }
        if let Some(last) = self.last_dispatch {
            if now.saturating_sub(last) < self.period {
                return Dispatch::Waiting;
            }
        }

        self.last_dispatch = Some(now);
        let request = DetectionRequest {
            frame: frame.clone(),
            region: self.region,
            timestamp: now,
            sequence,
        };
        let sent = match &self.link {
            Some(link) => link.requests.try_send(request),
            None => return Dispatch::Disabled,
        };

        match sent {
            Ok(()) => {
                self.stats.dispatched += 1;
                metrics::counter!("dms_detector_dispatch_total", "outcome" => "sent").increment(1);
                debug!("Detection dispatched for frame {}", sequence);
                Dispatch::Sent
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.busy += 1;
                metrics::counter!("dms_detector_dispatch_total", "outcome" => "busy").increment(1);
                debug!("Detector busy, skipping frame {}", sequence);
                Dispatch::Busy
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Detector worker stopped, disabling secondary detection");
                self.link = None;
                Dispatch::Disabled
            }
        }
    }

    /// Newest completed result, possibly several frames old
    pub fn latest(&self) -> Option<Arc<DetectionResult>> {
        self.link.as_ref().and_then(|link| link.latest.borrow().clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.link.is_some()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
