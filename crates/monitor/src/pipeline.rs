//! Per-session monitoring pipeline

use alerting::{AlertEvent, AlertKind, DriverStatus, NotificationSink};
use detector_scheduler::{DetectorScheduler, Dispatch};
use dms::{
    FaceModel, LandmarkFrame, LandmarkProvider, MetricExtractor, Metrics, NoFaceDetected, PoseSolver, SignalSet,
    TemporalTracker, TrackerSnapshot,
};
use event_fusion::AlertFusion;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::fps::FpsMeter;
use crate::settings::Settings;

/// What happened on one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub sequence: u64,
    pub timestamp: Duration,
    /// Absent when no face was found or the landmarks were unusable
    pub metrics: Option<Metrics>,
    /// Absent when the frame was skipped
    pub signals: Option<SignalSet>,
    pub snapshot: TrackerSnapshot,
    /// Active alerts in priority order
    pub active: Vec<AlertKind>,
    pub status: DriverStatus,
    /// Events delivered to the sink this frame
    pub events: Vec<AlertEvent>,
    pub face_visible: bool,
    pub dispatch: Dispatch,
    pub fps: f64,
}

/// Running session counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    pub skipped_no_face: u64,
    pub skipped_invalid: u64,
    /// Activation notifications per kind
    pub notifications: BTreeMap<AlertKind, u64>,
    pub deactivations: u64,
    pub detections_dispatched: u64,
    pub fps: f64,
}

/// Consecutive face-less frame counter
#[derive(Debug)]
struct FacePresence {
    threshold: usize,
    absent_frames: usize,
    visible: bool,
}

impl FacePresence {
    fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            absent_frames: 0,
            visible: true,
        }
    }

    fn absent(&mut self) {
        self.absent_frames += 1;
        if self.visible && self.absent_frames >= self.threshold {
            self.visible = false;
            warn!("No face detected for {} frames", self.absent_frames);
        }
    }

    fn present(&mut self) {
        if !self.visible {
            info!("Face reacquired after {} frames", self.absent_frames);
        }
        self.absent_frames = 0;
        self.visible = true;
    }
}

/// One driver monitoring session.
///
/// Owns every piece of per-session state, so several monitors can run side
/// by side. `F` is the raw camera frame handed to the secondary detector.
pub struct DriverMonitor<P, F, S> {
    extractor: MetricExtractor<P>,
    tracker: TemporalTracker,
    scheduler: DetectorScheduler<F>,
    fusion: AlertFusion,
    sink: S,
    presence: FacePresence,
    fps: FpsMeter,
    stats: SessionStats,
}

impl<P, F, S> DriverMonitor<P, F, S>
where
    P: PoseSolver,
    F: Clone + Send + 'static,
    S: NotificationSink,
{
    pub fn new(settings: &Settings, solver: P, scheduler: DetectorScheduler<F>, sink: S) -> Self {
        info!(
            "Creating driver monitor: {}x{} @ {} fps, detector {}",
            settings.camera.width,
            settings.camera.height,
            settings.camera.target_fps,
            if scheduler.is_enabled() { "enabled" } else { "disabled" }
        );

        Self {
            extractor: MetricExtractor::new(solver, FaceModel::default(), settings.camera.intrinsics()),
            tracker: TemporalTracker::new(settings.tracker.clone()),
            scheduler,
            fusion: AlertFusion::new(settings.fusion.clone()),
            sink,
            presence: FacePresence::new(settings.no_face_threshold()),
            fps: FpsMeter::default(),
            stats: SessionStats::default(),
        }
    }

    /// Run the landmark provider on a camera frame, then process the result
    pub fn process_frame<L>(&mut self, provider: &mut L, frame: &F, timestamp: Duration, sequence: u64) -> FrameReport
    where
        L: LandmarkProvider<Frame = F>,
    {
        let landmarks = provider.landmarks(frame);
        self.process(frame, landmarks, timestamp, sequence)
    }

    /// Process one frame whose landmarks were already extracted
    pub fn process(
        &mut self,
        frame: &F,
        landmarks: Result<LandmarkFrame, NoFaceDetected>,
        timestamp: Duration,
        sequence: u64,
    ) -> FrameReport {
        self.stats.frames += 1;
        metrics::counter!("dms_frames_total").increment(1);
        let fps = self.fps.update(timestamp);
        self.stats.fps = fps;

        let dispatch = self.scheduler.tick(timestamp, sequence, frame);
        if dispatch == Dispatch::Sent {
            self.stats.detections_dispatched += 1;
        }

        let (metrics, signals) = match landmarks {
            Err(NoFaceDetected) => {
                self.presence.absent();
                self.stats.skipped_no_face += 1;
                metrics::counter!("dms_frames_skipped_total", "reason" => "no_face").increment(1);
                (None, None)
            }
            Ok(mut landmarks) => {
                // The pipeline clock is authoritative for timers
                landmarks.timestamp = timestamp;
                landmarks.sequence = sequence;
                self.presence.present();
                match self.extractor.extract(&landmarks) {
                    Ok(metrics) => {
                        let signals = self.tracker.update(&metrics);
                        (Some(metrics), Some(signals))
                    }
                    Err(e) => {
                        debug!("Skipping frame {}: {}", sequence, e);
                        self.stats.skipped_invalid += 1;
                        metrics::counter!("dms_frames_skipped_total", "reason" => "invalid_landmarks").increment(1);
                        (None, None)
                    }
                }
            }
        };

        let latest = self.scheduler.latest();
        let outcome = self.fusion.fuse(signals.as_ref(), latest.as_deref(), timestamp);

        for event in &outcome.events {
            if event.activated {
                *self.stats.notifications.entry(event.kind).or_insert(0) += 1;
                metrics::counter!("dms_notifications_total", "kind" => event.kind.as_str()).increment(1);
            } else {
                self.stats.deactivations += 1;
            }
            self.sink.notify(event);
        }

        FrameReport {
            sequence,
            timestamp,
            metrics,
            signals,
            snapshot: self.tracker.snapshot(),
            active: outcome.active,
            status: outcome.status,
            events: outcome.events,
            face_visible: self.presence.visible,
            dispatch,
            fps,
        }
    }

    /// Start over for a new driver; the detector keeps running
    pub fn reset(&mut self) {
        info!("Resetting driver monitor session state");
        self.tracker.reset();
        self.fusion.reset();
        self.presence = FacePresence::new(self.presence.threshold);
        self.fps.reset();
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn status(&self) -> DriverStatus {
        self.fusion.status()
    }

    pub fn face_visible(&self) -> bool {
        self.presence.visible
    }

    pub fn tracker(&self) -> &TemporalTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &DetectorScheduler<F> {
        &self.scheduler
    }

    pub fn solver_mut(&mut self) -> &mut P {
        self.extractor.solver_mut()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detector_scheduler::DetectorError;
    use dms::{CameraIntrinsics, HeadPose, ImagePoint, Point3, RigidTransform, SolverFailure};

    struct FrontalSolver;

    impl PoseSolver for FrontalSolver {
        fn solve(
            &self,
            _image_points: &[ImagePoint; 6],
            _model: &FaceModel,
            _intrinsics: &CameraIntrinsics,
        ) -> Result<RigidTransform, SolverFailure> {
            Ok(RigidTransform::from_euler(HeadPose::default(), [0.0, 0.0, 600.0]))
        }
    }

    fn monitor(settings: &Settings) -> DriverMonitor<FrontalSolver, (), Vec<AlertEvent>> {
        let scheduler = DetectorScheduler::disabled(&settings.detector, &DetectorError::Unavailable("test".into()));
        DriverMonitor::new(settings, FrontalSolver, scheduler, Vec::new())
    }

    fn face(sequence: u64) -> LandmarkFrame {
        LandmarkFrame::new(vec![Point3::default(); 478], Duration::from_millis(33 * sequence), sequence)
    }

    #[test]
    fn test_no_face_threshold() {
        let settings = Settings {
            no_face_frames: Some(3),
            ..Default::default()
        };
        let mut monitor = monitor(&settings);

        for i in 0..2u64 {
            let report = monitor.process(&(), Err(NoFaceDetected), Duration::from_millis(33 * i), i);
            assert!(report.face_visible);
            assert!(report.signals.is_none());
        }
        let lost = monitor.process(&(), Err(NoFaceDetected), Duration::from_millis(66), 2);
        assert!(!lost.face_visible);

        let back = monitor.process(&(), Ok(face(3)), Duration::from_millis(99), 3);
        assert!(back.face_visible);
        assert!(back.signals.is_some());
        assert_eq!(monitor.stats().skipped_no_face, 3);
    }

    #[test]
    fn test_short_landmark_set_is_skipped() {
        let mut monitor = monitor(&Settings::default());
        let short = LandmarkFrame::new(vec![Point3::default(); 10], Duration::ZERO, 0);

        let report = monitor.process(&(), Ok(short), Duration::ZERO, 0);
        assert!(report.metrics.is_none());
        assert!(report.signals.is_none());
        assert!(report.events.is_empty());
        assert_eq!(monitor.stats().skipped_invalid, 1);
        assert_eq!(monitor.tracker().snapshot().closed_frames, 0);
    }

    #[test]
    fn test_disabled_detector_never_dispatches() {
        let mut monitor = monitor(&Settings::default());
        for i in 0..90u64 {
            let report = monitor.process(&(), Ok(face(i)), Duration::from_millis(33 * i), i);
            assert_eq!(report.dispatch, Dispatch::Disabled);
            assert!(!report.active.contains(&AlertKind::PhoneDetected));
        }
        assert_eq!(monitor.stats().detections_dispatched, 0);
    }
}
