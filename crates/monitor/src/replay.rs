//! Recorded-session replay
//!
//! A recording is a JSON-lines file, one camera frame per line:
//!
//! ```json
//! {"timestamp_ms": 33, "sequence": 1, "landmarks": [[412.0, 300.5, -3.1], ...], "rotation": [[1,0,0],[0,1,0],[0,0,1]]}
//! ```
//!
//! `landmarks` is `null` when no face was found and `rotation` is `null` when
//! the pose solver failed on that frame.

use alerting::NotificationSink;
use detector_scheduler::{DetectorError, DetectorScheduler};
use dms::{
    CameraIntrinsics, FaceModel, ImagePoint, LandmarkFrame, NoFaceDetected, Point3, PoseSolver, RigidTransform,
    SolverFailure,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::{DriverMonitor, SessionStats};
use crate::settings::Settings;

/// Replay error types
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One recorded camera frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub timestamp_ms: u64,
    pub sequence: u64,
    #[serde(default)]
    pub landmarks: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    pub rotation: Option<[[f64; 3]; 3]>,
}

impl ReplayRecord {
    pub fn timestamp(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }

    pub fn landmark_frame(&self) -> Result<LandmarkFrame, NoFaceDetected> {
        let points = self.landmarks.as_ref().ok_or(NoFaceDetected)?;
        let points = points.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();
        Ok(LandmarkFrame::new(points, self.timestamp(), self.sequence))
    }
}

/// Pose solver that hands back the rotation recorded for the current frame
#[derive(Debug, Default)]
pub struct RecordedPoseSolver {
    current: Option<RigidTransform>,
}

impl RecordedPoseSolver {
    /// Load the recorded rotation for the next frame
    pub fn load(&mut self, rotation: Option<[[f64; 3]; 3]>) {
        self.current = rotation.and_then(|rows| {
            let flat: Vec<f64> = rows.iter().flatten().copied().collect();
            let matrix = Array2::from_shape_vec((3, 3), flat).ok()?;
            match RigidTransform::new(matrix, [0.0; 3]) {
                Ok(transform) => Some(transform),
                Err(e) => {
                    debug!("Ignoring recorded rotation: {}", e);
                    None
                }
            }
        });
    }
}

impl PoseSolver for RecordedPoseSolver {
    fn solve(
        &self,
        _image_points: &[ImagePoint; 6],
        _model: &FaceModel,
        _intrinsics: &CameraIntrinsics,
    ) -> Result<RigidTransform, SolverFailure> {
        self.current
            .clone()
            .ok_or_else(|| SolverFailure("no pose recorded for this frame".into()))
    }
}

/// Replay a recording through a fresh monitor; phone detection is off since
/// recordings carry no pixels
pub fn run<R, S>(reader: R, settings: &Settings, sink: S) -> Result<SessionStats, ReplayError>
where
    R: BufRead,
    S: NotificationSink,
{
    let scheduler: DetectorScheduler<()> = DetectorScheduler::disabled(
        &settings.detector,
        &DetectorError::Unavailable("recordings carry no image data".into()),
    );
    let mut monitor = DriverMonitor::new(settings, RecordedPoseSolver::default(), scheduler, sink);

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord =
            serde_json::from_str(&line).map_err(|source| ReplayError::Parse { line: index + 1, source })?;

        monitor.solver_mut().load(record.rotation);
        let report = monitor.process(&(), record.landmark_frame(), record.timestamp(), record.sequence);
        for event in &report.events {
            debug!("Frame {}: {} {}", report.sequence, event.kind, if event.activated { "on" } else { "off" });
        }
    }

    let stats = monitor.stats().clone();
    info!(
        "Replay finished: {} frames, {} without face, {} invalid, {:.1} fps",
        stats.frames, stats.skipped_no_face, stats.skipped_invalid, stats.fps
    );
    Ok(stats)
}
