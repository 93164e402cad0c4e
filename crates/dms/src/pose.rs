//! Head pose: reference model, camera intrinsics, and the pose solver interface
//!
//! Axes follow the camera convention: x right, y down, z forward (away from
//! the camera). A solved rotation maps head-model coordinates into camera
//! coordinates and is decomposed as `R = Ry(yaw) * Rx(pitch) * Rz(roll)`.
//! With that decomposition a positive yaw turns the nose toward image left
//! (the driver's right on an unmirrored camera) and a positive pitch turns it
//! down.

use ndarray::{array, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DmsError;

/// Head pose (Euler angles)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Yaw (left-right rotation) in degrees, positive = looking right
    pub yaw: f64,
    /// Pitch (up-down tilt) in degrees, positive = looking down
    pub pitch: f64,
    /// Roll (side tilt) in degrees
    pub roll: f64,
}

/// A 2D landmark projection in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

/// Pinhole camera intrinsics (no lens distortion)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Approximate intrinsics for an uncalibrated camera: focal length equal
    /// to the frame width, principal point at the frame centre
    pub fn from_frame_size(width: u32, height: u32) -> Self {
        let focal = f64::from(width);
        Self {
            fx: focal,
            fy: focal,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
        }
    }

    /// 3x3 camera matrix
    pub fn matrix(&self) -> Array2<f64> {
        array![
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::from_frame_size(1280, 720)
    }
}

/// Generic 3D face model (millimetres, camera axes, nose tip at the origin)
#[derive(Debug, Clone, PartialEq)]
pub struct FaceModel {
    /// Model points in [`crate::POSE_LANDMARKS`] order
    pub points: [[f64; 3]; 6],
}

impl Default for FaceModel {
    fn default() -> Self {
        Self {
            points: [
                [0.0, 0.0, 0.0],      // nose tip
                [0.0, 63.6, 12.5],    // chin
                [-43.3, -32.7, 26.0], // eye outer corner (image left)
                [43.3, -32.7, 26.0],  // eye outer corner (image right)
                [-28.9, 28.9, 24.1],  // mouth corner (image left)
                [28.9, 28.9, 24.1],   // mouth corner (image right)
            ],
        }
    }
}

/// Rigid head transform returned by a pose solver
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    rotation: Array2<f64>,
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// Wrap a solver rotation matrix, which must be 3x3 and finite
    pub fn new(rotation: Array2<f64>, translation: [f64; 3]) -> Result<Self, DmsError> {
        if rotation.shape() != [3, 3] {
            return Err(DmsError::InvalidRotation(format!(
                "expected 3x3 matrix, got {:?}",
                rotation.shape()
            )));
        }
        if rotation.iter().any(|v| !v.is_finite()) {
            return Err(DmsError::InvalidRotation("non-finite element".into()));
        }
        Ok(Self {
            rotation,
            translation,
        })
    }

    /// Build a transform from Euler angles in degrees
    pub fn from_euler(pose: HeadPose, translation: [f64; 3]) -> Self {
        let (sy, cy) = pose.yaw.to_radians().sin_cos();
        let (sp, cp) = pose.pitch.to_radians().sin_cos();
        let (sr, cr) = pose.roll.to_radians().sin_cos();

        let ry = array![[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]];
        let rx = array![[1.0, 0.0, 0.0], [0.0, cp, -sp], [0.0, sp, cp]];
        let rz = array![[cr, -sr, 0.0], [sr, cr, 0.0], [0.0, 0.0, 1.0]];

        Self {
            rotation: ry.dot(&rx).dot(&rz),
            translation,
        }
    }

    pub fn rotation(&self) -> &Array2<f64> {
        &self.rotation
    }

    /// Decompose the rotation into yaw, pitch, roll (degrees)
    pub fn euler_angles(&self) -> HeadPose {
        let r = &self.rotation;
        let sin_pitch = (-r[[1, 2]]).clamp(-1.0, 1.0);
        let pitch = sin_pitch.asin();

        let (yaw, roll) = if sin_pitch.abs() < 1.0 - 1e-9 {
            (r[[0, 2]].atan2(r[[2, 2]]), r[[1, 0]].atan2(r[[1, 1]]))
        } else {
            // Gimbal lock: fold roll into yaw
            ((-r[[2, 0]]).atan2(r[[0, 0]]), 0.0)
        };

        HeadPose {
            yaw: yaw.to_degrees(),
            pitch: pitch.to_degrees(),
            roll: roll.to_degrees(),
        }
    }
}

/// The solver could not recover a pose for this frame
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Pose solver failed: {0}")]
pub struct SolverFailure(pub String);

/// Perspective-n-point solver (external numerical backend)
pub trait PoseSolver {
    /// Find the rigid transform mapping `model` points onto their observed
    /// projections `image_points`
    fn solve(
        &self,
        image_points: &[ImagePoint; 6],
        model: &FaceModel,
        intrinsics: &CameraIntrinsics,
    ) -> Result<RigidTransform, SolverFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pose_eq(actual: HeadPose, expected: HeadPose) {
        assert!((actual.yaw - expected.yaw).abs() < 1e-9, "yaw {:?}", actual);
        assert!((actual.pitch - expected.pitch).abs() < 1e-9, "pitch {:?}", actual);
        assert!((actual.roll - expected.roll).abs() < 1e-9, "roll {:?}", actual);
    }

    #[test]
    fn test_euler_decomposition_inverts_composition() {
        for &(yaw, pitch, roll) in &[
            (0.0, 0.0, 0.0),
            (30.0, 0.0, 0.0),
            (-42.0, 12.5, 3.0),
            (10.0, -25.0, -15.0),
            (75.0, 60.0, 20.0),
        ] {
            let pose = HeadPose { yaw, pitch, roll };
            let transform = RigidTransform::from_euler(pose, [0.0, 0.0, 500.0]);
            assert_pose_eq(transform.euler_angles(), pose);
        }
    }

    #[test]
    fn test_positive_yaw_turns_nose_to_image_left() {
        let transform = RigidTransform::from_euler(
            HeadPose { yaw: 30.0, pitch: 0.0, roll: 0.0 },
            [0.0; 3],
        );
        // Nose points toward the camera (-z) in the neutral pose
        let nose = transform.rotation().dot(&array![0.0, 0.0, -1.0]);
        assert!(nose[0] < 0.0);
    }

    #[test]
    fn test_positive_pitch_turns_nose_down() {
        let transform = RigidTransform::from_euler(
            HeadPose { yaw: 0.0, pitch: 20.0, roll: 0.0 },
            [0.0; 3],
        );
        let nose = transform.rotation().dot(&array![0.0, 0.0, -1.0]);
        // y grows downward in camera coordinates
        assert!(nose[1] > 0.0);
    }

    #[test]
    fn test_gimbal_lock_keeps_pitch() {
        let transform = RigidTransform::from_euler(
            HeadPose { yaw: 20.0, pitch: 90.0, roll: 0.0 },
            [0.0; 3],
        );
        let pose = transform.euler_angles();
        assert!((pose.pitch - 90.0).abs() < 1e-6);
        assert!((pose.yaw - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_malformed_rotation() {
        assert!(RigidTransform::new(Array2::zeros((2, 3)), [0.0; 3]).is_err());

        let mut rotation = Array2::eye(3);
        rotation[[0, 1]] = f64::NAN;
        assert!(RigidTransform::new(rotation, [0.0; 3]).is_err());

        assert!(RigidTransform::new(Array2::eye(3), [0.0; 3]).is_ok());
    }

    #[test]
    fn test_intrinsics_from_frame_size() {
        let intrinsics = CameraIntrinsics::from_frame_size(640, 480);
        assert_eq!(intrinsics.fx, 640.0);
        assert_eq!(intrinsics.cx, 320.0);
        assert_eq!(intrinsics.cy, 240.0);
        assert_eq!(intrinsics.matrix()[[2, 2]], 1.0);
    }
}
