use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::error::AlgebraError;
use crate::quaternion::Quaternion;

/// A dual quaternion `real + eps * dual` representing a rigid body transform.
///
/// `real` is the rotation and `dual = 0.5 * t * real` encodes the translation `t`.
/// The pair is a valid rigid motion when `real` has unit norm and `real . dual == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualQuaternion {
    /// Rotation part.
    pub real: Quaternion,
    /// Translation-encoding part.
    pub dual: Quaternion,
}

impl DualQuaternion {
    /// The identity transform.
    pub const IDENTITY: Self = Self::new(Quaternion::IDENTITY, Quaternion::ZERO);

    /// Store the pair as-is, without normalizing.
    pub const fn new(real: Quaternion, dual: Quaternion) -> Self {
        Self { real, dual }
    }

    /// Create a rigid transform that rotates by `rotation` and then translates by `translation`.
    pub fn from_rotation_translation(rotation: Quaternion, translation: &[f64; 3]) -> Self {
        let dual = Quaternion::from_translation(translation) * rotation * 0.5;
        Self::new(rotation, dual)
    }

    /// Create a dual quaternion from `[real.w, real.x, real.y, real.z, dual.w, dual.x, dual.y, dual.z]`.
    pub fn from_array(values: &[f64; 8]) -> Self {
        Self::new(
            Quaternion::new(values[0], values[1], values[2], values[3]),
            Quaternion::new(values[4], values[5], values[6], values[7]),
        )
    }

    /// Same layout as [`DualQuaternion::from_array`], checking the slice length.
    pub fn from_slice(values: &[f64]) -> Result<Self, AlgebraError> {
        let values: &[f64; 8] = values
            .try_into()
            .map_err(|_| AlgebraError::InvalidDimension {
                expected: 8,
                actual: values.len(),
            })?;
        Ok(Self::from_array(values))
    }

    /// Components as `[real.w, real.x, real.y, real.z, dual.w, dual.x, dual.y, dual.z]`.
    pub fn to_array(&self) -> [f64; 8] {
        let r = self.real.to_array();
        let d = self.dual.to_array();
        [r[0], r[1], r[2], r[3], d[0], d[1], d[2], d[3]]
    }

    /// Reverse the sense of the transform: the pose of B relative to A becomes the pose of A
    /// relative to B.
    ///
    /// Both parts are conjugated, which for a unit dual quaternion is its inverse. Applying it
    /// twice gives back the original value.
    pub fn conjugate_reverse(&self) -> Self {
        Self::new(self.real.conjugate(), self.dual.conjugate())
    }

    /// The rotation quaternion.
    pub fn rotation(&self) -> Quaternion {
        self.real
    }

    /// The translation vector, `2 * dual * conj(real)`.
    pub fn translation(&self) -> [f64; 3] {
        (self.dual * self.real.conjugate() * 2.0).vector()
    }

    /// Apply the transform to a point: rotate, then translate.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = Quaternion::from_translation(point);
        let rotated = (self.real * p * self.real.conjugate()).vector();
        let t = self.translation();
        [rotated[0] + t[0], rotated[1] + t[1], rotated[2] + t[2]]
    }

    /// Divide both parts by the norm of the real part.
    ///
    /// Returns `None` when the real part is zero or not finite.
    pub fn normalize(&self) -> Option<Self> {
        let norm = self.real.norm();
        if norm > 0.0 && norm.is_finite() {
            let inv = 1.0 / norm;
            Some(Self::new(self.real * inv, self.dual * inv))
        } else {
            None
        }
    }

    /// Check that the real part has unit norm and is orthogonal to the dual part.
    pub fn is_unit_rigid(&self, tolerance: f64) -> bool {
        (self.real.norm() - 1.0).abs() <= tolerance && self.real.dot(&self.dual).abs() <= tolerance
    }
}

impl Default for DualQuaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Compose two transforms: `(a * b)` applies `b` first, then `a`.
impl Mul for DualQuaternion {
    type Output = DualQuaternion;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(
            self.real * rhs.real,
            self.real * rhs.dual + self.dual * rhs.real,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn random_transform(rng: &mut impl Rng) -> DualQuaternion {
        let rvec = [
            rng.random_range(-1.5..1.5),
            rng.random_range(-1.5..1.5),
            rng.random_range(-1.5..1.5),
        ];
        let t = [
            rng.random_range(-5.0..5.0),
            rng.random_range(-5.0..5.0),
            rng.random_range(-5.0..5.0),
        ];
        DualQuaternion::from_rotation_translation(Quaternion::from_axis_angle_vector(&rvec), &t)
    }

    fn assert_array_eq<const N: usize>(a: &[f64; N], b: &[f64; N], epsilon: f64) {
        for i in 0..N {
            assert_relative_eq!(a[i], b[i], epsilon = epsilon);
        }
    }

    #[test]
    fn test_rotation_translation_roundtrip() {
        let rotation = Quaternion::from_axis_angle_vector(&[0.3, 0.1, -0.8]);
        let dq = DualQuaternion::from_rotation_translation(rotation, &[1.0, -2.0, 3.5]);
        assert_eq!(dq.rotation(), rotation);
        assert_array_eq(&dq.translation(), &[1.0, -2.0, 3.5], 1e-12);
        assert!(dq.is_unit_rigid(1e-12));
    }

    #[test]
    fn test_transform_point() {
        let rotation = Quaternion::from_axis_angle_vector(&[0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        let dq = DualQuaternion::from_rotation_translation(rotation, &[10.0, 0.0, 0.0]);
        assert_array_eq(&dq.transform_point(&[1.0, 2.0, 3.0]), &[8.0, 1.0, 3.0], 1e-12);
    }

    #[test]
    fn test_composition_order() {
        let mut rng = rand::rng();
        for _ in 0..10 {
            let a = random_transform(&mut rng);
            let b = random_transform(&mut rng);
            let p = [
                rng.random_range(-3.0..3.0),
                rng.random_range(-3.0..3.0),
                rng.random_range(-3.0..3.0),
            ];
            let composed = (a * b).transform_point(&p);
            let sequential = a.transform_point(&b.transform_point(&p));
            assert_array_eq(&composed, &sequential, 1e-9);
        }
    }

    #[test]
    fn test_conjugate_reverse_involution() {
        let mut rng = rand::rng();
        let dq = random_transform(&mut rng);
        assert_array_eq(
            &dq.conjugate_reverse().conjugate_reverse().to_array(),
            &dq.to_array(),
            1e-15,
        );
    }

    #[test]
    fn test_conjugate_reverse_inverts() {
        let mut rng = rand::rng();
        let dq = random_transform(&mut rng);
        let identity = dq * dq.conjugate_reverse();
        assert_array_eq(
            &identity.to_array(),
            &DualQuaternion::IDENTITY.to_array(),
            1e-9,
        );

        let p = [0.5, -1.0, 2.0];
        let back = dq.conjugate_reverse().transform_point(&dq.transform_point(&p));
        assert_array_eq(&back, &p, 1e-9);
    }

    #[test]
    fn test_normalize() {
        let dq = DualQuaternion::from_rotation_translation(
            Quaternion::from_axis_angle_vector(&[0.1, 0.2, 0.3]),
            &[1.0, 2.0, 3.0],
        );
        let scaled = DualQuaternion::new(dq.real * -4.0, dq.dual * -4.0);
        assert!(!scaled.is_unit_rigid(1e-9));

        let normalized = scaled.normalize().expect("non-zero real part");
        assert!(normalized.is_unit_rigid(1e-12));
        assert_array_eq(&normalized.translation(), &[1.0, 2.0, 3.0], 1e-12);

        let zero = DualQuaternion::new(Quaternion::ZERO, dq.dual);
        assert_eq!(zero.normalize(), None);
    }

    #[test]
    fn test_array_layout() -> Result<(), Box<dyn std::error::Error>> {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let dq = DualQuaternion::from_slice(&values)?;
        assert_eq!(dq.real, Quaternion::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(dq.dual, Quaternion::new(5.0, 6.0, 7.0, 8.0));
        assert_eq!(dq.to_array(), values);
        assert!(DualQuaternion::from_slice(&values[..7]).is_err());
        Ok(())
    }
}
