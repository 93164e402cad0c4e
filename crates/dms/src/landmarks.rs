//! Landmark frames and the landmark provider interface

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::DmsError;

/// Left eye contour (p1..p6), MediaPipe Face Mesh numbering
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye contour (p1..p6)
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Mouth: left corner, right corner, top inner lip, bottom inner lip
pub const MOUTH: [usize; 4] = [61, 291, 13, 14];

/// Landmarks used as head pose correspondences, in [`crate::FaceModel`] order:
/// nose tip, chin, eye outer corners, mouth corners
pub const POSE_LANDMARKS: [usize; 6] = [1, 152, 33, 263, 61, 291];

/// A single facial landmark in image coordinates (pixels, z relative depth)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance in the image plane, ignoring depth
    pub fn planar_distance(&self, other: &Point3) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// All landmarks of one detected face in one camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: Vec<Point3>,
    /// Capture time relative to session start
    pub timestamp: Duration,
    /// Camera frame sequence number
    pub sequence: u64,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point3>, timestamp: Duration, sequence: u64) -> Self {
        Self {
            points,
            timestamp,
            sequence,
        }
    }

    /// Look up a landmark by its semantic index
    pub fn point(&self, index: usize) -> Result<&Point3, DmsError> {
        self.points.get(index).ok_or(DmsError::InvalidLandmarkSet {
            index,
            available: self.points.len(),
        })
    }

    /// Look up a fixed group of landmarks, failing on the first missing index
    pub fn points<const N: usize>(&self, indices: &[usize; N]) -> Result<[Point3; N], DmsError> {
        let mut out = [Point3::default(); N];
        for (slot, &index) in out.iter_mut().zip(indices.iter()) {
            *slot = *self.point(index)?;
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The landmark provider found no face in the frame
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No face detected")]
pub struct NoFaceDetected;

/// Source of per-frame facial landmarks (face mesh model or recording)
pub trait LandmarkProvider {
    /// Raw camera frame type consumed by the provider
    type Frame;

    fn landmarks(&mut self, frame: &Self::Frame) -> Result<LandmarkFrame, NoFaceDetected>;
}
