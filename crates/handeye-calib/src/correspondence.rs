use handeye_algebra::{rotation::vec3_from_slice, AlgebraError, DualQuaternion, Quaternion};
use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Number of values per pose: 3 translation followed by 3 rotation parameters.
pub const POSE_DIM: usize = 6;

const ROBOT_STREAM: &str = "robot";
const CAMERA_STREAM: &str = "camera";

/// The correspondence record supplied by the pose provider.
///
/// Index `i` of both streams was captured at the same robot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    /// When the correspondences were recorded.
    pub time: String,
    /// Robot tool poses: `[tx, ty, tz, roll, pitch, yaw]`.
    #[serde(rename = "tcp2robot")]
    pub robot_poses: Vec<Vec<f64>>,
    /// Calibration target poses in the camera frame: `[tx, ty, tz, rx, ry, rz]` with a Rodrigues
    /// rotation vector.
    #[serde(rename = "camera2grid")]
    pub camera_poses: Vec<Vec<f64>>,
}

impl CorrespondenceSet {
    /// Create a record from the two raw pose streams.
    pub fn new(
        time: impl Into<String>,
        robot_poses: Vec<Vec<f64>>,
        camera_poses: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            time: time.into(),
            robot_poses,
            camera_poses,
        }
    }

    /// Number of robot poses in the record.
    pub fn len(&self) -> usize {
        self.robot_poses.len()
    }

    /// Whether the record holds no robot poses.
    pub fn is_empty(&self) -> bool {
        self.robot_poses.is_empty()
    }

    /// Validate the record and pair up the poses.
    ///
    /// Fails on the first malformed pose; nothing partial is returned.
    pub fn correspondences(&self) -> Result<Vec<Correspondence>, CalibrationError> {
        if self.robot_poses.len() != self.camera_poses.len() {
            return Err(CalibrationError::MismatchedPoseCounts {
                robot: self.robot_poses.len(),
                camera: self.camera_poses.len(),
            });
        }
        if self.robot_poses.is_empty() {
            return Err(CalibrationError::EmptyCorrespondences);
        }

        self.robot_poses
            .iter()
            .zip(self.camera_poses.iter())
            .enumerate()
            .map(|(index, (robot, camera))| -> Result<_, CalibrationError> {
                let (translation, euler_angles) = split_pose(robot, ROBOT_STREAM, index)?;
                let (camera_translation, rotation_vector) =
                    split_pose(camera, CAMERA_STREAM, index)?;
                Ok(Correspondence {
                    robot: RobotPose {
                        translation,
                        euler_angles,
                    },
                    camera: CameraPose {
                        translation: camera_translation,
                        rotation_vector,
                    },
                })
            })
            .collect()
    }
}

/// Robot tool pose with an Euler-angle rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotPose {
    /// Translation.
    pub translation: [f64; 3],
    /// `[roll, pitch, yaw]` in radians.
    pub euler_angles: [f64; 3],
}

impl RobotPose {
    /// Rigid transform of the pose.
    pub fn to_dual_quaternion(&self) -> DualQuaternion {
        DualQuaternion::from_rotation_translation(
            Quaternion::from_euler_angles(&self.euler_angles),
            &self.translation,
        )
    }
}

/// Calibration target pose relative to the camera, with a Rodrigues rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Translation.
    pub translation: [f64; 3],
    /// Rotation axis scaled by the angle in radians.
    pub rotation_vector: [f64; 3],
}

impl CameraPose {
    /// Rigid transform of the pose.
    pub fn to_dual_quaternion(&self) -> DualQuaternion {
        DualQuaternion::from_rotation_translation(
            Quaternion::from_axis_angle_vector(&self.rotation_vector),
            &self.translation,
        )
    }
}

/// One robot pose paired with the camera pose captured at the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Robot-side pose.
    pub robot: RobotPose,
    /// Camera-side pose.
    pub camera: CameraPose,
}

fn split_pose(
    pose: &[f64],
    stream: &'static str,
    index: usize,
) -> Result<([f64; 3], [f64; 3]), CalibrationError> {
    if pose.len() != POSE_DIM {
        return Err(CalibrationError::InvalidPoseDimension {
            stream,
            index,
            expected: POSE_DIM,
            actual: pose.len(),
        });
    }

    let to_error = |err: AlgebraError| match err {
        AlgebraError::NonFinite(_) => CalibrationError::NonFinitePose { stream, index },
        AlgebraError::InvalidDimension { expected, actual } => {
            CalibrationError::InvalidPoseDimension {
                stream,
                index,
                expected,
                actual,
            }
        }
    };

    let translation = vec3_from_slice(&pose[..3]).map_err(to_error)?;
    let rotation = vec3_from_slice(&pose[3..]).map_err(to_error)?;
    Ok((translation, rotation))
}
