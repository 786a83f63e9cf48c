use crate::error::AlgebraError;

/// Rotation vectors shorter than this are treated as the identity rotation.
pub const SMALL_ANGLE: f64 = 1e-12;

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Compute the rotation matrix from a Rodrigues (axis-angle) vector.
///
/// The direction of `rvec` is the rotation axis and its magnitude the angle in radians.
///
/// # Arguments
///
/// * `rvec` - The rotation vector.
///
/// # Returns
///
/// The row-major rotation matrix.
///
/// Example:
///
/// ```
/// use handeye_algebra::rotation::rodrigues_to_rotation_matrix;
///
/// let rvec = [std::f64::consts::FRAC_PI_2, 0.0, 0.0];
/// let rotation = rodrigues_to_rotation_matrix(&rvec);
/// assert!((rotation[1][2] + 1.0).abs() < 1e-12);
/// assert!((rotation[2][1] - 1.0).abs() < 1e-12);
/// ```
pub fn rodrigues_to_rotation_matrix(rvec: &[f64; 3]) -> [[f64; 3]; 3] {
    let Some((axis, angle)) = split_rotation_vector(rvec) else {
        return IDENTITY;
    };

    let k = skew(&axis);
    let k2 = matmul33(&k, &k);
    let (s, c) = angle.sin_cos();

    // R = I + sin(angle) * K + (1 - cos(angle)) * K^2
    let mut m = IDENTITY;
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val += s * k[i][j] + (1.0 - c) * k2[i][j];
        }
    }
    m
}

/// Split a rotation vector into its unit axis and angle, `None` below [`SMALL_ANGLE`].
pub fn split_rotation_vector(rvec: &[f64; 3]) -> Option<([f64; 3], f64)> {
    let angle = rvec.iter().map(|v| v * v).sum::<f64>().sqrt();
    if angle < SMALL_ANGLE {
        return None;
    }
    Some((rvec.map(|v| v / angle), angle))
}

/// Cross-product matrix `[v]x` with `[v]x * u == v x u`.
fn skew(v: &[f64; 3]) -> [[f64; 3]; 3] {
    [[0.0, -v[2], v[1]], [v[2], 0.0, -v[0]], [-v[1], v[0], 0.0]]
}

/// Compute the rotation matrix from `[roll, pitch, yaw]` Euler angles in radians.
///
/// The angles rotate about the fixed X, Y and Z axes in that order, i.e.
/// `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.
pub fn euler_to_rotation_matrix(angles: &[f64; 3]) -> [[f64; 3]; 3] {
    let (sr, cr) = angles[0].sin_cos();
    let (sp, cp) = angles[1].sin_cos();
    let (sy, cy) = angles[2].sin_cos();

    [
        [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
        [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
        [-sp, cp * sr, cp * cr],
    ]
}

/// Copy a slice into a 3-vector, checking its length and that every value is finite.
pub fn vec3_from_slice(values: &[f64]) -> Result<[f64; 3], AlgebraError> {
    if values.len() != 3 {
        return Err(AlgebraError::InvalidDimension {
            expected: 3,
            actual: values.len(),
        });
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(AlgebraError::NonFinite(i));
    }
    Ok([values[0], values[1], values[2]])
}

/// Multiply two row-major 3x3 matrices.
fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut m = [[0.0; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    m
}
