use std::time::SystemTime;

use handeye_algebra::DualQuaternion;

use crate::correspondence::{Correspondence, CorrespondenceSet};
use crate::error::CalibrationError;
use crate::result::{CalibrationDiagnostics, CalibrationResult};
use crate::system::{build_constraint_matrix, NUM_UNKNOWNS, ROWS_PER_SAMPLE};

/// Dimension of the null space of a well-posed constraint matrix.
const EXPECTED_NULL_SPACE_DIM: usize = 2;

/// Numeric tolerances of the solver.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Singular values at or below `rank_tolerance * max_singular_value` count toward the null
    /// space.
    pub rank_tolerance: f64,
    /// Warn when the smallest singular value outside the null space falls below
    /// `conditioning_warning * max_singular_value`.
    pub conditioning_warning: f64,
    /// Minimum squared norm of the real part for a root to be normalizable.
    pub min_real_norm: f64,
    /// Maximum relative residual `||A x|| / (max_singular_value * ||x||)` of the selected root.
    pub residual_tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-9,
            conditioning_warning: 1e-6,
            min_real_norm: 1e-12,
            residual_tolerance: 1e-3,
        }
    }
}

/// Run the calibration on a correspondence record.
///
/// # Arguments
///
/// * `set` - The raw robot and camera pose streams.
/// * `params` - Solver tolerances.
///
/// # Returns
///
/// The tool offset and camera-to-robot transforms, stamped with the current time.
pub fn calibrate(
    set: &CorrespondenceSet,
    params: &SolverParams,
) -> Result<CalibrationResult, CalibrationError> {
    log::debug!("calibrating with correspondences recorded at {}", set.time);
    let correspondences = set.correspondences()?;
    calibrate_correspondences(&correspondences, params)
}

/// Run the calibration on validated correspondences.
pub fn calibrate_correspondences(
    correspondences: &[Correspondence],
    params: &SolverParams,
) -> Result<CalibrationResult, CalibrationError> {
    if correspondences.is_empty() {
        return Err(CalibrationError::EmptyCorrespondences);
    }

    let mat = build_constraint_matrix(correspondences);
    let (tool_offset, camera_to_robot, diagnostics) =
        solve_constraint_matrix(mat.as_ref(), params)?;

    Ok(CalibrationResult {
        time: SystemTime::now(),
        tool_offset,
        camera_to_robot,
        diagnostics,
    })
}

/// Recover the tool offset and the camera-to-robot transform from a stacked constraint matrix.
///
/// The matrix has a 2-dimensional null space spanned by the true solution and a companion
/// vector with a zero real part. The solution is the combination of the two right singular
/// vectors with the smallest singular values whose tool offset is a rigid transform: its dual
/// part orthogonal to its real part, and the real part as large as possible.
///
/// Fails with [`CalibrationError::InvalidMatrixShape`] unless `mat` is `(8n) x 16`, and with
/// [`CalibrationError::DegenerateSolution`] when the selected root does not satisfy the system
/// within [`SolverParams::residual_tolerance`].
///
/// # Returns
///
/// `(tool_offset, camera_to_robot, diagnostics)`, both transforms with unit real parts.
pub fn solve_constraint_matrix(
    mat: faer::MatRef<'_, f64>,
    params: &SolverParams,
) -> Result<(DualQuaternion, DualQuaternion, CalibrationDiagnostics), CalibrationError> {
    if mat.ncols() != NUM_UNKNOWNS || mat.nrows() % ROWS_PER_SAMPLE != 0 {
        return Err(CalibrationError::InvalidMatrixShape {
            rows: mat.nrows(),
            cols: mat.ncols(),
        });
    }
    let num_samples = mat.nrows() / ROWS_PER_SAMPLE;

    if mat.nrows() == 0 {
        return Err(CalibrationError::IllPosedCalibration {
            rank: 0,
            null_space_dim: NUM_UNKNOWNS,
            num_samples,
        });
    }

    let svd = mat.svd();

    // missing singular values of a short matrix are zero
    let s = svd.s_diagonal();
    let mut singular_values = vec![0.0; NUM_UNKNOWNS];
    for (i, value) in singular_values.iter_mut().enumerate().take(s.nrows()) {
        *value = s.read(i);
    }
    log::debug!("singular values: {:?}", singular_values);

    let s_max = singular_values[0];
    let rank = singular_values
        .iter()
        .filter(|&&value| value > params.rank_tolerance * s_max)
        .count();
    let null_space_dim = NUM_UNKNOWNS - rank;

    let mut diagnostics = CalibrationDiagnostics {
        num_samples,
        rank,
        null_space_dim,
        singular_values,
        residual: 0.0,
    };

    if null_space_dim > EXPECTED_NULL_SPACE_DIM {
        return Err(CalibrationError::IllPosedCalibration {
            rank,
            null_space_dim,
            num_samples,
        });
    }

    if null_space_dim < EXPECTED_NULL_SPACE_DIM {
        log::warn!(
            "no exact null space (rank {}), using the least-squares solution",
            rank
        );
    }

    let s_outside = diagnostics.singular_values[NUM_UNKNOWNS - EXPECTED_NULL_SPACE_DIM - 1];
    if s_outside < params.conditioning_warning * s_max {
        log::warn!(
            "poorly conditioned constraint matrix: singular value {:e} against maximum {:e}",
            s_outside,
            s_max
        );
    }

    let v = svd.v();
    let column = |j: usize| -> [f64; NUM_UNKNOWNS] {
        let mut col = [0.0; NUM_UNKNOWNS];
        for (i, value) in col.iter_mut().enumerate() {
            *value = v.read(i, j);
        }
        col
    };
    let v1 = column(NUM_UNKNOWNS - 2);
    let v2 = column(NUM_UNKNOWNS - 1);

    let x = select_root(&v1, &v2, params)?;

    diagnostics.residual = relative_residual(mat, &x, s_max);
    log::debug!("relative residual of the selected root: {:e}", diagnostics.residual);
    if diagnostics.residual.is_nan() || diagnostics.residual > params.residual_tolerance {
        return Err(CalibrationError::DegenerateSolution(format!(
            "inconsistent constraints: relative residual {:e} exceeds {:e}",
            diagnostics.residual, params.residual_tolerance
        )));
    }

    let tool_offset = split_transform(&x[..8], "tool offset")?;
    let camera_to_robot = split_transform(&x[8..], "camera to robot")?;

    Ok((tool_offset, camera_to_robot, diagnostics))
}

/// Find `x = l * v1 + m * v2` whose first dual quaternion has orthogonal real and dual parts
/// and a unit real part.
fn select_root(
    v1: &[f64; NUM_UNKNOWNS],
    v2: &[f64; NUM_UNKNOWNS],
    params: &SolverParams,
) -> Result<[f64; NUM_UNKNOWNS], CalibrationError> {
    let (a1, b1) = (&v1[0..4], &v1[4..8]);
    let (a2, b2) = (&v2[0..4], &v2[4..8]);

    // real . dual of the combination is the quadratic form [l, m] Q [l, m]^T
    let q00 = dot(a1, b1);
    let q11 = dot(a2, b2);
    let q01 = 0.5 * (dot(a1, b2) + dot(a2, b1));

    let mean = 0.5 * (q00 + q11);
    let radius = (0.25 * (q00 - q11).powi(2) + q01 * q01).sqrt();
    let (e_min, e_max) = (mean - radius, mean + radius);

    let u_min = eigenvector_2x2(q00, q01, q11, e_min);
    let u_max = [-u_min[1], u_min[0]];

    let candidates: Vec<[f64; 2]> = if e_min > 0.0 || e_max < 0.0 {
        log::warn!(
            "orthogonality constraint has no real root (eigenvalues {:e}, {:e}), using the closest direction",
            e_min,
            e_max
        );
        if e_min.abs() < e_max.abs() {
            vec![u_min]
        } else {
            vec![u_max]
        }
    } else if radius == 0.0 {
        // every combination is orthogonal
        vec![u_min, u_max]
    } else {
        // e_min * alpha^2 + e_max * beta^2 == 0 along (alpha, beta) in the eigenbasis
        let alpha = e_max.max(0.0).sqrt();
        let beta = (-e_min).max(0.0).sqrt();
        vec![
            [alpha * u_min[0] + beta * u_max[0], alpha * u_min[1] + beta * u_max[1]],
            [alpha * u_min[0] - beta * u_max[0], alpha * u_min[1] - beta * u_max[1]],
        ]
    };

    // the valid root has the largest real part, the companion root is close to zero
    let mut scored = candidates
        .iter()
        .map(|z| {
            let mut x = [0.0; NUM_UNKNOWNS];
            for (i, value) in x.iter_mut().enumerate() {
                *value = z[0] * v1[i] + z[1] * v2[i];
            }
            (dot(&x[..4], &x[..4]), x)
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let (real_norm2, x) = scored[0];
    if real_norm2.is_nan() || real_norm2 <= params.min_real_norm {
        return Err(CalibrationError::DegenerateSolution(format!(
            "no root with a normalizable real part (squared norm {:e})",
            real_norm2
        )));
    }
    if let Some((other, _)) = scored.get(1) {
        if *other > 0.5 * real_norm2 {
            log::warn!(
                "near-degenerate root selection: squared real norms {:e} and {:e}",
                real_norm2,
                other
            );
        }
    }
    log::debug!("selected root with squared real norm {:e}", real_norm2);

    let scale = 1.0 / real_norm2.sqrt();
    Ok(x.map(|value| value * scale))
}

/// Unit eigenvector of the symmetric matrix `[[q00, q01], [q01, q11]]` for eigenvalue `e`.
fn eigenvector_2x2(q00: f64, q01: f64, q11: f64, e: f64) -> [f64; 2] {
    let c1 = [q01, e - q00];
    let c2 = [e - q11, q01];
    let n1 = c1[0].hypot(c1[1]);
    let n2 = c2[0].hypot(c2[1]);

    if n1 >= n2 && n1 > 0.0 {
        [c1[0] / n1, c1[1] / n1]
    } else if n2 > 0.0 {
        [c2[0] / n2, c2[1] / n2]
    } else {
        [1.0, 0.0]
    }
}

/// Normalize an 8-vector into a dual quaternion with `real.w >= 0`.
fn split_transform(values: &[f64], name: &str) -> Result<DualQuaternion, CalibrationError> {
    let dq = DualQuaternion::from_slice(values)
        .map_err(|err| CalibrationError::DegenerateSolution(format!("{name}: {err}")))?
        .normalize()
        .ok_or_else(|| {
            CalibrationError::DegenerateSolution(format!("{name} has a zero rotation part"))
        })?;

    if dq.real.w < 0.0 {
        Ok(DualQuaternion::new(-dq.real, -dq.dual))
    } else {
        Ok(dq)
    }
}

/// `||mat * x|| / (s_max * ||x||)`.
fn relative_residual(mat: faer::MatRef<'_, f64>, x: &[f64; NUM_UNKNOWNS], s_max: f64) -> f64 {
    let residual2: f64 = (0..mat.nrows())
        .map(|i| {
            let row: f64 = (0..NUM_UNKNOWNS).map(|j| mat.read(i, j) * x[j]).sum();
            row * row
        })
        .sum();
    residual2.sqrt() / (s_max * dot(x, x).sqrt())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
