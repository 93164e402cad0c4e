//! Per-frame facial metrics

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::landmarks::{LandmarkFrame, Point3, LEFT_EYE, MOUTH, POSE_LANDMARKS, RIGHT_EYE};
use crate::pose::{CameraIntrinsics, FaceModel, HeadPose, ImagePoint, PoseSolver};
use crate::DmsError;

/// Scalar metrics derived from one landmark frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Left eye aspect ratio
    pub ear_left: f64,
    /// Right eye aspect ratio
    pub ear_right: f64,
    /// Mouth aspect ratio
    pub mar: f64,
    /// Head pose, absent when the solver failed for this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_pose: Option<HeadPose>,
    /// Timestamp of the source frame
    pub timestamp: Duration,
}

impl Metrics {
    /// Mean of both eye aspect ratios
    pub fn ear_mean(&self) -> f64 {
        (self.ear_left + self.ear_right) / 2.0
    }
}

/// Eye aspect ratio from six contour points p1..p6:
/// `(|p2-p6| + |p3-p5|) / (2 |p1-p4|)`.
///
/// Returns 0.0 for a degenerate eye with coincident corners.
pub fn eye_aspect_ratio(eye: &[Point3; 6]) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = eye;
    let vertical = p2.planar_distance(p6) + p3.planar_distance(p5);
    let horizontal = 2.0 * p1.planar_distance(p4);
    if horizontal <= 0.0 {
        return 0.0;
    }
    vertical / horizontal
}

/// Mouth aspect ratio from (left, right, top, bottom): vertical opening over
/// corner-to-corner width. Returns 0.0 for a zero-width mouth.
pub fn mouth_aspect_ratio(mouth: &[Point3; 4]) -> f64 {
    let [left, right, top, bottom] = mouth;
    let horizontal = left.planar_distance(right);
    if horizontal <= 0.0 {
        return 0.0;
    }
    top.planar_distance(bottom) / horizontal
}

/// Converts landmark frames into [`Metrics`]
pub struct MetricExtractor<P> {
    solver: P,
    model: FaceModel,
    intrinsics: CameraIntrinsics,
}

impl<P: PoseSolver> MetricExtractor<P> {
    pub fn new(solver: P, model: FaceModel, intrinsics: CameraIntrinsics) -> Self {
        Self {
            solver,
            model,
            intrinsics,
        }
    }

    /// Compute metrics for one frame.
    ///
    /// Fails only when the frame lacks a required landmark; a solver failure
    /// leaves `head_pose` empty instead.
    pub fn extract(&self, frame: &LandmarkFrame) -> Result<Metrics, DmsError> {
        let ear_left = eye_aspect_ratio(&frame.points(&LEFT_EYE)?);
        let ear_right = eye_aspect_ratio(&frame.points(&RIGHT_EYE)?);
        let mar = mouth_aspect_ratio(&frame.points(&MOUTH)?);
        let head_pose = self.head_pose(frame)?;

        Ok(Metrics {
            ear_left,
            ear_right,
            mar,
            head_pose,
            timestamp: frame.timestamp,
        })
    }

    fn head_pose(&self, frame: &LandmarkFrame) -> Result<Option<HeadPose>, DmsError> {
        let image_points = frame
            .points(&POSE_LANDMARKS)?
            .map(|p| ImagePoint { x: p.x, y: p.y });

        match self.solver.solve(&image_points, &self.model, &self.intrinsics) {
            Ok(transform) => Ok(Some(transform.euler_angles())),
            Err(e) => {
                debug!("Frame {}: {}", frame.sequence, e);
                Ok(None)
            }
        }
    }

    pub fn solver(&self) -> &P {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut P {
        &mut self.solver
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }
}
