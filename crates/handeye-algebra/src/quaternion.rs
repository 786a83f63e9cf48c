use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::AlgebraError;
use crate::rotation::{rodrigues_to_rotation_matrix, SMALL_ANGLE};

/// A quaternion `w + x*i + y*j + z*k`.
///
/// Unit quaternions represent rotations. Pure quaternions (`w = 0`) represent 3D vectors,
/// which is how translations are lifted into the algebra.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Scalar part.
    pub w: f64,
    /// First vector component.
    pub x: f64,
    /// Second vector component.
    pub y: f64,
    /// Third vector component.
    pub z: f64,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// The zero quaternion.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a quaternion from its scalar and vector components.
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Create a quaternion from a `[w, x, y, z]` slice.
    pub fn from_slice(values: &[f64]) -> Result<Self, AlgebraError> {
        match values {
            [w, x, y, z] => Ok(Self::new(*w, *x, *y, *z)),
            _ => Err(AlgebraError::InvalidDimension {
                expected: 4,
                actual: values.len(),
            }),
        }
    }

    /// Extract the unit quaternion of a row-major 3x3 rotation matrix.
    ///
    /// PRECONDITION: `mat` is orthonormal with determinant 1. A matrix with non-finite
    /// entries yields a non-finite quaternion, which [`Quaternion::normalize`] rejects.
    pub fn from_rotation_matrix(mat: &[[f64; 3]; 3]) -> Self {
        let [[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]] = *mat;
        let trace = m00 + m11 + m22;

        // pick the largest diagonal term to keep the square root well away from zero
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new(0.25 * s, (m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new((m21 - m12) / s, 0.25 * s, (m01 + m10) / s, (m02 + m20) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m02 - m20) / s, (m01 + m10) / s, 0.25 * s, (m12 + m21) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m10 - m01) / s, (m02 + m20) / s, (m12 + m21) / s, 0.25 * s)
        };

        q.normalize().unwrap_or(q)
    }

    /// Create a rotation from a Rodrigues vector (unit axis scaled by the angle in radians).
    ///
    /// The vector is first expanded into a rotation matrix and the quaternion is extracted from
    /// that matrix.
    pub fn from_axis_angle_vector(rvec: &[f64; 3]) -> Self {
        Self::from_rotation_matrix(&rodrigues_to_rotation_matrix(rvec))
    }

    /// Create a rotation from `[roll, pitch, yaw]` Euler angles in radians.
    ///
    /// Same convention as [`crate::rotation::euler_to_rotation_matrix`]: `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.
    pub fn from_euler_angles(angles: &[f64; 3]) -> Self {
        let (sr, cr) = (angles[0] * 0.5).sin_cos();
        let (sp, cp) = (angles[1] * 0.5).sin_cos();
        let (sy, cy) = (angles[2] * 0.5).sin_cos();

        Self::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        )
    }

    /// Lift a translation into the pure quaternion `(0, t)`.
    pub fn from_translation(t: &[f64; 3]) -> Self {
        Self::new(0.0, t[0], t[1], t[2])
    }

    /// Negate the vector part.
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Four-dimensional dot product.
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Euclidean norm of the four components.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scale to unit norm. Returns `None` for a zero or non-finite quaternion.
    pub fn normalize(&self) -> Option<Self> {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            Some(*self * (1.0 / norm))
        } else {
            None
        }
    }

    /// The vector part `[x, y, z]`.
    pub fn vector(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Components as `[w, x, y, z]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Row-major rotation matrix of a unit quaternion.
    pub fn to_rotation_matrix(&self) -> [[f64; 3]; 3] {
        let Self { w, x, y, z } = *self;
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ]
    }

    /// Rodrigues vector of a unit quaternion, with the angle in `[0, pi]`.
    pub fn to_axis_angle_vector(&self) -> [f64; 3] {
        // q and -q are the same rotation, take the one with the short angle
        let q = if self.w < 0.0 { -*self } else { *self };
        let v = q.vector();
        let sin_half = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();

        let scale = if sin_half < SMALL_ANGLE {
            2.0 / q.w
        } else {
            2.0 * sin_half.atan2(q.w) / sin_half
        };

        [v[0] * scale, v[1] * scale, v[2] * scale]
    }

    /// Matrix `L(q)` such that `q * p == L(q) * p` for any quaternion `p` in `[w, x, y, z]` order.
    pub fn left_matrix(&self) -> [[f64; 4]; 4] {
        let Self { w, x, y, z } = *self;
        [
            [w, -x, -y, -z],
            [x, w, -z, y],
            [y, z, w, -x],
            [z, -y, x, w],
        ]
    }

    /// Matrix `R(q)` such that `p * q == R(q) * p` for any quaternion `p` in `[w, x, y, z]` order.
    pub fn right_matrix(&self) -> [[f64; 4]; 4] {
        let Self { w, x, y, z } = *self;
        [
            [w, -x, -y, -z],
            [x, w, z, -y],
            [y, -z, w, x],
            [z, y, -x, w],
        ]
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product.
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Self) -> Self::Output {
        let (a, b) = (self, rhs);
        Self::new(
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        )
    }
}

impl Mul<f64> for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.w * rhs, self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Add for Quaternion {
    type Output = Quaternion;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w + rhs.w,
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
        )
    }
}

impl Sub for Quaternion {
    type Output = Quaternion;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w - rhs.w,
            self.x - rhs.x,
            self.y - rhs.y,
            self.z - rhs.z,
        )
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;

    fn neg(self) -> Self::Output {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }
}

impl From<[f64; 4]> for Quaternion {
    fn from(q: [f64; 4]) -> Self {
        Self::new(q[0], q[1], q[2], q[3])
    }
}
