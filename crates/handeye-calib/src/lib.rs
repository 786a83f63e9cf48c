#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Hand-eye calibration
//!
//! Recovers the camera-to-robot transform and the tool offset from paired robot and camera
//! poses (`AX = YB`) with the dual-quaternion formulation: every correspondence contributes an
//! 8x16 block of linear constraints, and the solution is read off the 2-dimensional null space
//! of the stacked matrix.
//!
//! - **Correspondence**: validated pose pairs from the correspondence record.
//! - **System**: per-sample constraint blocks and the stacked matrix.
//! - **Solver**: null space extraction and root selection.
//! - **Result**: the calibration output record.

/// Pose correspondences.
pub mod correspondence;
pub use correspondence::{CameraPose, Correspondence, CorrespondenceSet, RobotPose};

/// Error types for the calibration.
pub mod error;
pub use error::CalibrationError;

/// Calibration results.
pub mod result;
pub use result::{CalibrationDiagnostics, CalibrationResult, RigidTransform};

/// Null space solver.
pub mod solver;
pub use solver::{calibrate, calibrate_correspondences, solve_constraint_matrix, SolverParams};

/// Linear system construction.
pub mod system;
pub use system::{align_camera_sign, align_camera_signs, build_constraint_matrix, constraint_block};
