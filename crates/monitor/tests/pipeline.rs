//! End-to-end pipeline tests

use alerting::{AlertEvent, AlertKind, DriverStatus};
use detector_scheduler::{BoundingBox, DetectorError, DetectorScheduler, ObjectDetector, RegionOfInterest};
use dms::{
    CameraIntrinsics, FaceModel, HeadPose, ImagePoint, LandmarkFrame, LandmarkProvider, NoFaceDetected, Point3,
    PoseSolver, RigidTransform, SolverFailure, LEFT_EYE, MOUTH, RIGHT_EYE,
};
use monitor::{DriverMonitor, Settings};
use std::time::Duration;

const FRAME: Duration = Duration::from_nanos(33_333_333);

/// Solver reporting a fixed head pose
struct StaticSolver(HeadPose);

impl PoseSolver for StaticSolver {
    fn solve(
        &self,
        _image_points: &[ImagePoint; 6],
        _model: &FaceModel,
        _intrinsics: &CameraIntrinsics,
    ) -> Result<RigidTransform, SolverFailure> {
        Ok(RigidTransform::from_euler(self.0, [0.0, 0.0, 650.0]))
    }
}

/// Synthetic camera frame: the face geometry a landmark model would find
#[derive(Debug, Clone, Copy)]
struct SyntheticFrame {
    ear: f64,
    face: bool,
}

/// Builds a face with the requested eye aspect ratio on both eyes
struct SyntheticProvider;

impl LandmarkProvider for SyntheticProvider {
    type Frame = SyntheticFrame;

    fn landmarks(&mut self, frame: &SyntheticFrame) -> Result<LandmarkFrame, NoFaceDetected> {
        if !frame.face {
            return Err(NoFaceDetected);
        }
        // Eye 4 wide, lids at +-h: EAR = (2h + 2h) / 8
        let h = frame.ear * 2.0;
        let mut points = vec![Point3::default(); 478];
        let eye = [(0.0, 0.0), (1.0, h), (3.0, h), (4.0, 0.0), (3.0, -h), (1.0, -h)];
        for (i, &(x, y)) in eye.iter().enumerate() {
            points[LEFT_EYE[i]] = Point3::new(x + 100.0, y + 100.0, 0.0);
            points[RIGHT_EYE[i]] = Point3::new(x + 120.0, y + 100.0, 0.0);
        }
        let mouth = [(0.0, 0.0), (40.0, 0.0), (20.0, -4.0), (20.0, 4.0)];
        for (i, &(x, y)) in mouth.iter().enumerate() {
            points[MOUTH[i]] = Point3::new(x + 90.0, y + 160.0, 0.0);
        }
        Ok(LandmarkFrame::new(points, Duration::ZERO, 0))
    }
}

fn no_detector(settings: &Settings) -> DetectorScheduler<SyntheticFrame> {
    DetectorScheduler::disabled(&settings.detector, &DetectorError::Unavailable("no model".into()))
}

fn frame(ear: f64) -> SyntheticFrame {
    SyntheticFrame { ear, face: true }
}

#[test]
fn drowsiness_first_flagged_at_frame_92() {
    let settings = Settings::default();
    let mut monitor = DriverMonitor::new(
        &settings,
        StaticSolver(HeadPose::default()),
        no_detector(&settings),
        Vec::<AlertEvent>::new(),
    );
    let mut provider = SyntheticProvider;

    for i in 0..120u32 {
        let ear = if i < 50 { 0.30 } else { 0.10 };
        let report = monitor.process_frame(&mut provider, &frame(ear), FRAME * i, u64::from(i));
        let signals = report.signals.expect("face visible every frame");
        assert_eq!(signals.drowsy, i >= 92, "frame {}", i);
        assert!(!signals.yawning);
    }

    assert_eq!(monitor.status(), DriverStatus::Alert(AlertKind::Drowsy));
    assert_eq!(
        monitor.sink().as_slice(),
        &[AlertEvent {
            kind: AlertKind::Drowsy,
            activated: true,
            timestamp: FRAME * 92,
        }]
    );
    assert_eq!(monitor.stats().notifications.get(&AlertKind::Drowsy), Some(&1));
}

#[test]
fn sustained_look_away_notifies_once_per_cooldown() {
    let settings = Settings::default();
    let mut monitor = DriverMonitor::new(
        &settings,
        StaticSolver(HeadPose { yaw: 30.0, pitch: 0.0, roll: 0.0 }),
        no_detector(&settings),
        Vec::<AlertEvent>::new(),
    );
    let mut provider = SyntheticProvider;

    // 3 s of looking away at 30 fps
    for i in 0..90u32 {
        monitor.process_frame(&mut provider, &frame(0.30), FRAME * i, u64::from(i));
    }

    let times: Vec<Duration> = monitor
        .sink()
        .iter()
        .filter(|e| e.kind == AlertKind::Distracted && e.activated)
        .map(|e| e.timestamp)
        .collect();
    // Crosses 1 s at frame 31; 30 frames later is still just short of the cooldown
    assert_eq!(times, vec![FRAME * 31, FRAME * 62]);
}

#[test]
fn lost_face_keeps_alert_state() {
    let settings = Settings {
        no_face_frames: Some(5),
        ..Default::default()
    };
    let mut monitor = DriverMonitor::new(
        &settings,
        StaticSolver(HeadPose::default()),
        no_detector(&settings),
        Vec::<AlertEvent>::new(),
    );
    let mut provider = SyntheticProvider;

    // Eyes shut long enough to be drowsy
    for i in 0..60u32 {
        monitor.process_frame(&mut provider, &frame(0.05), FRAME * i, u64::from(i));
    }
    assert_eq!(monitor.status(), DriverStatus::Alert(AlertKind::Drowsy));
    let events_before = monitor.sink().len();

    let gone = SyntheticFrame { ear: 0.0, face: false };
    for i in 60..70u32 {
        let report = monitor.process_frame(&mut provider, &gone, FRAME * i, u64::from(i));
        assert!(report.signals.is_none());
        assert!(report.events.is_empty());
        assert_eq!(report.active, vec![AlertKind::Drowsy]);
        assert_eq!(report.face_visible, i < 64, "frame {}", i);
    }
    assert_eq!(monitor.sink().len(), events_before);
    assert_eq!(monitor.stats().skipped_no_face, 10);
}

#[test]
fn reset_clears_session_state() {
    let settings = Settings::default();
    let mut monitor = DriverMonitor::new(
        &settings,
        StaticSolver(HeadPose::default()),
        no_detector(&settings),
        Vec::<AlertEvent>::new(),
    );
    let mut provider = SyntheticProvider;

    for i in 0..60u32 {
        monitor.process_frame(&mut provider, &frame(0.05), FRAME * i, u64::from(i));
    }
    monitor.reset();

    assert_eq!(monitor.status(), DriverStatus::Normal);
    assert_eq!(monitor.tracker().perclos(), 0.0);
    assert!(monitor.face_visible());
}

/// Sees a phone in every frame after a short inference delay
struct PhoneDetector;

impl ObjectDetector for PhoneDetector {
    type Frame = SyntheticFrame;

    fn detect(&mut self, _frame: &SyntheticFrame, _region: &RegionOfInterest) -> Result<Vec<BoundingBox>, DetectorError> {
        std::thread::sleep(Duration::from_millis(20));
        Ok(vec![BoundingBox {
            x: 500.0,
            y: 520.0,
            width: 80.0,
            height: 150.0,
            confidence: 0.82,
        }])
    }
}

#[tokio::test]
async fn phone_detection_flows_into_alerts() {
    let mut settings = Settings::default();
    settings.detector.enabled = true;
    let scheduler = DetectorScheduler::spawn(&settings.detector, Ok(PhoneDetector));
    let mut monitor = DriverMonitor::new(
        &settings,
        StaticSolver(HeadPose::default()),
        scheduler,
        Vec::<AlertEvent>::new(),
    );
    let mut provider = SyntheticProvider;

    // The loop never waits on the detector; yield between frames so the
    // worker gets to publish
    let mut first_phone = None;
    for i in 0..300u32 {
        let report = monitor.process_frame(&mut provider, &frame(0.30), FRAME * i, u64::from(i));
        if report.active.contains(&AlertKind::PhoneDetected) {
            first_phone = Some(i);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let first_phone = first_phone.expect("phone alert never raised");
    assert!(first_phone > 0, "result cannot be ready on the dispatch frame");
    assert_eq!(monitor.status(), DriverStatus::Alert(AlertKind::PhoneDetected));
    assert!(monitor
        .sink()
        .iter()
        .any(|e| e.kind == AlertKind::PhoneDetected && e.activated));
    assert!(monitor.stats().detections_dispatched >= 1);
}
