//! Detection results and the object detector interface

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{DetectorError, SchedulerError};

/// Detected object box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl BoundingBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Output of one completed detection call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub boxes: Vec<BoundingBox>,
    /// Timestamp of the frame the detector ran on
    pub timestamp: Duration,
    /// Sequence number of that frame
    pub sequence: u64,
}

impl DetectionResult {
    /// Whether any box reaches `min_confidence`
    pub fn any_above(&self, min_confidence: f32) -> bool {
        self.boxes.iter().any(|b| b.confidence >= min_confidence)
    }
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Sub-rectangle of the frame handed to the detector, in normalised
/// coordinates (0.0 to 1.0 of frame width/height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionOfInterest {
    /// The whole frame
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    /// Full-width band from `top_ratio` of the frame height to the bottom
    pub fn lower_band(top_ratio: f64) -> Self {
        let top = top_ratio.clamp(0.0, 1.0);
        Self {
            x: 0.0,
            y: top,
            width: 1.0,
            height: 1.0 - top,
        }
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_unit(self.x) && in_unit(self.y) && in_unit(self.width) && in_unit(self.height)) {
            return Err(SchedulerError::InvalidRegion(format!("{:?} not normalised", self)));
        }
        if self.x + self.width > 1.0 + f64::EPSILON || self.y + self.height > 1.0 + f64::EPSILON {
            return Err(SchedulerError::InvalidRegion(format!("{:?} exceeds the frame", self)));
        }
        Ok(())
    }

    /// Region in pixels for a frame of the given size
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let w = f64::from(frame_width);
        let h = f64::from(frame_height);
        let x = (self.x * w).floor().clamp(0.0, w) as u32;
        let y = (self.y * h).floor().clamp(0.0, h) as u32;
        let right = ((self.x + self.width) * w).ceil().clamp(0.0, w) as u32;
        let bottom = ((self.y + self.height) * h).ceil().clamp(0.0, h) as u32;
        PixelRect {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }

    /// Whether a box centre falls inside the region
    pub fn contains(&self, bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> bool {
        let (cx, cy) = bbox.center();
        let nx = f64::from(cx) / f64::from(frame_width.max(1));
        let ny = f64::from(cy) / f64::from(frame_height.max(1));
        nx >= self.x && nx <= self.x + self.width && ny >= self.y && ny <= self.y + self.height
    }
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self::lower_band(0.55)
    }
}

/// Slow secondary detector (external model backend).
///
/// Calls run on a blocking worker thread, never on the frame loop.
pub trait ObjectDetector: Send + 'static {
    /// Raw camera frame type
    type Frame: Send + 'static;

    fn detect(
        &mut self,
        frame: &Self::Frame,
        region: &RegionOfInterest,
    ) -> Result<Vec<BoundingBox>, DetectorError>;
}
