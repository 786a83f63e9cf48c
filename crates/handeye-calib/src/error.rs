use thiserror::Error;

/// Error types for the hand-eye calibration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    /// The correspondence record holds no samples.
    #[error("No correspondences provided")]
    EmptyCorrespondences,

    /// The robot and camera pose streams differ in length.
    #[error("Mismatched pose counts: robot ({robot}) != camera ({camera})")]
    MismatchedPoseCounts {
        /// Number of robot poses.
        robot: usize,
        /// Number of camera poses.
        camera: usize,
    },

    /// A pose does not have 3 translation and 3 rotation values.
    #[error("{stream} pose {index} has {actual} values, expected {expected}")]
    InvalidPoseDimension {
        /// Name of the pose stream.
        stream: &'static str,
        /// Index of the pose in the stream.
        index: usize,
        /// Number of values required.
        expected: usize,
        /// Number of values provided.
        actual: usize,
    },

    /// A pose holds a NaN or infinite value.
    #[error("{stream} pose {index} contains a non-finite value")]
    NonFinitePose {
        /// Name of the pose stream.
        stream: &'static str,
        /// Index of the pose in the stream.
        index: usize,
    },

    /// The constraint matrix does not have 16 columns and a multiple of 8 rows.
    #[error("Invalid constraint matrix shape {rows} x {cols}, expected (8n) x 16")]
    InvalidMatrixShape {
        /// Number of rows provided.
        rows: usize,
        /// Number of columns provided.
        cols: usize,
    },

    /// The constraint matrix does not have a 2-dimensional null space.
    #[error(
        "Ill-posed calibration: rank {rank} of 16 leaves a {null_space_dim}-dimensional null space \
         with {num_samples} correspondences (need distinct rotation axes across at least 3 poses)"
    )]
    IllPosedCalibration {
        /// Effective rank of the constraint matrix.
        rank: usize,
        /// Dimension of the null space, `16 - rank`.
        null_space_dim: usize,
        /// Number of correspondences in the system.
        num_samples: usize,
    },

    /// No candidate in the null space is a valid rigid transform.
    #[error("Degenerate solution: {0}")]
    DegenerateSolution(String),
}

impl CalibrationError {
    /// Whether the error comes from malformed pose data.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyCorrespondences
                | Self::MismatchedPoseCounts { .. }
                | Self::InvalidPoseDimension { .. }
                | Self::NonFinitePose { .. }
                | Self::InvalidMatrixShape { .. }
        )
    }

    /// Whether the error comes from a rank-deficient constraint system.
    pub fn is_ill_posed(&self) -> bool {
        matches!(self, Self::IllPosedCalibration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = CalibrationError::MismatchedPoseCounts {
            robot: 3,
            camera: 2,
        };
        assert!(err.is_invalid_input());
        assert!(!err.is_ill_posed());
        assert_eq!(
            err.to_string(),
            "Mismatched pose counts: robot (3) != camera (2)"
        );

        let err = CalibrationError::IllPosedCalibration {
            rank: 8,
            null_space_dim: 8,
            num_samples: 1,
        };
        assert!(err.is_ill_posed());
        assert!(!err.is_invalid_input());

        let err = CalibrationError::InvalidMatrixShape { rows: 8, cols: 15 };
        assert!(err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "Invalid constraint matrix shape 8 x 15, expected (8n) x 16"
        );
    }
}
