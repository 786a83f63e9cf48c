use std::time::SystemTime;

use handeye_algebra::{DualQuaternion, Quaternion};
use serde::{Deserialize, Serialize};

/// Result of the hand-eye calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    /// When the calibration was computed.
    pub time: SystemTime,
    /// Transform between the tool frame and the target mounting frame.
    pub tool_offset: DualQuaternion,
    /// Transform between the camera and the robot base.
    pub camera_to_robot: DualQuaternion,
    /// Numerical facts about the solve.
    pub diagnostics: CalibrationDiagnostics,
}

impl CalibrationResult {
    /// The tool offset as rotation and translation.
    pub fn tool_offset_transform(&self) -> RigidTransform {
        RigidTransform::from(&self.tool_offset)
    }

    /// The camera-to-robot transform as rotation and translation.
    pub fn camera_to_robot_transform(&self) -> RigidTransform {
        RigidTransform::from(&self.camera_to_robot)
    }
}

/// Rank information of the constraint matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationDiagnostics {
    /// Number of correspondences used.
    pub num_samples: usize,
    /// Effective rank of the constraint matrix.
    pub rank: usize,
    /// `16 - rank`.
    pub null_space_dim: usize,
    /// All 16 singular values in non-increasing order, zero-padded for short matrices.
    pub singular_values: Vec<f64>,
    /// Relative residual `||A x|| / (max_singular_value * ||x||)` of the selected root.
    pub residual: f64,
}

/// A rigid transform as a rotation and a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigidTransform {
    /// Unit rotation quaternion.
    pub rotation: Quaternion,
    /// Row-major rotation matrix.
    pub rotation_matrix: [[f64; 3]; 3],
    /// Translation vector.
    pub translation: [f64; 3],
}

impl From<&DualQuaternion> for RigidTransform {
    fn from(dq: &DualQuaternion) -> Self {
        Self {
            rotation: dq.rotation(),
            rotation_matrix: dq.rotation().to_rotation_matrix(),
            translation: dq.translation(),
        }
    }
}
