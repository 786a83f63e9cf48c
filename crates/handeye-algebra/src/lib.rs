#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Handeye Algebra
//!
//! Value types for rotations and rigid body transforms used by the hand-eye
//! calibration solver.
//!
//! - **Quaternion**: rotations (unit norm) and lifted 3D vectors (pure quaternions).
//! - **DualQuaternion**: rigid transforms as a `(real, dual)` quaternion pair.
//!
//! ## Example
//!
//! ```rust
//! use handeye_algebra::{DualQuaternion, Quaternion};
//!
//! let rotation = Quaternion::from_axis_angle_vector(&[0.0, 0.0, std::f64::consts::FRAC_PI_2]);
//! let transform = DualQuaternion::from_rotation_translation(rotation, &[10.0, 0.0, 0.0]);
//!
//! let point = transform.transform_point(&[1.0, 0.0, 0.0]);
//! assert!((point[0] - 10.0).abs() < 1e-12);
//! assert!((point[1] - 1.0).abs() < 1e-12);
//! ```

/// Dual quaternions for 3D rigid transformations.
pub mod dual_quaternion;
pub use dual_quaternion::DualQuaternion;

/// Error types for the algebra module.
pub mod error;
pub use error::AlgebraError;

/// Quaternions for 3D rotations and vectors.
pub mod quaternion;
pub use quaternion::Quaternion;

/// Rotation matrix conversions.
pub mod rotation;
