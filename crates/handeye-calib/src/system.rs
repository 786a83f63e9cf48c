use handeye_algebra::DualQuaternion;

use crate::correspondence::Correspondence;

/// Number of constraint rows contributed by one correspondence.
pub const ROWS_PER_SAMPLE: usize = 8;

/// Number of unknowns: 8 for the tool offset followed by 8 for the camera-to-robot transform.
pub const NUM_UNKNOWNS: usize = 16;

/// Constraint block of one correspondence.
///
/// Encodes `cameraToRobot = camera * toolOffset * robot_reversed` as 8 homogeneous linear
/// equations in the 16 unknowns `[toolOffset.real, toolOffset.dual, cameraToRobot.real,
/// cameraToRobot.dual]`, each quaternion in `[w, x, y, z]` order.
///
/// # Arguments
///
/// * `camera` - The camera-side transform.
/// * `robot_reversed` - The robot-side transform after [`DualQuaternion::conjugate_reverse`].
pub fn constraint_block(
    camera: &DualQuaternion,
    robot_reversed: &DualQuaternion,
) -> [[f64; NUM_UNKNOWNS]; ROWS_PER_SAMPLE] {
    let (c, t) = (camera, robot_reversed);

    // real part: c.real * g.real * t.real
    let real = matmul44(&c.real.left_matrix(), &t.real.right_matrix());

    // dual part: the product rule over the three factors, split by g.real and g.dual
    let dual = add44(
        &matmul44(&c.real.left_matrix(), &t.dual.right_matrix()),
        &matmul44(&c.dual.left_matrix(), &t.real.right_matrix()),
    );

    let mut block = [[0.0; NUM_UNKNOWNS]; ROWS_PER_SAMPLE];
    for i in 0..4 {
        block[i][..4].copy_from_slice(&real[i]);
        block[i][8 + i] = -1.0;

        block[4 + i][..4].copy_from_slice(&dual[i]);
        block[4 + i][4..8].copy_from_slice(&real[i]);
        block[4 + i][12 + i] = -1.0;
    }

    block
}

/// Pick the sign of `camera` that agrees with the reference sample.
///
/// `q` and `-q` encode the same transform but the constraint is linear, so every sample must
/// use the sign consistent with a single `toolOffset`/`cameraToRobot` pair. Relative to the
/// reference, `camera^-1 * camera_ref` and `robot_reversed * robot_reversed_ref^-1` are
/// conjugate rotations and share the same scalar part.
pub fn align_camera_sign(
    camera: &DualQuaternion,
    robot_reversed: &DualQuaternion,
    reference: (&DualQuaternion, &DualQuaternion),
) -> DualQuaternion {
    let (camera_ref, robot_ref) = reference;
    let camera_scalar = camera.real.dot(&camera_ref.real);
    let robot_scalar = robot_reversed.real.dot(&robot_ref.real);
    if camera_scalar * robot_scalar < 0.0 {
        DualQuaternion::new(-camera.real, -camera.dual)
    } else {
        *camera
    }
}

/// Robot-side rotations whose relative scalar part is below this leave the camera sign
/// undetermined.
const SIGN_AMBIGUITY: f64 = 1e-3;

/// Align the signs of all camera dual quaternions to the first one.
///
/// A sample is aligned through the already aligned sample with the largest
/// `|robot_reversed.real . reference.real|`. Half-turn relative motions have a vanishing
/// scalar part and carry no sign information, so they are only used when nothing better is
/// left.
pub fn align_camera_signs(cameras: &mut [DualQuaternion], robots_reversed: &[DualQuaternion]) {
    let n = cameras.len().min(robots_reversed.len());
    if n == 0 {
        return;
    }

    let mut aligned = vec![false; n];
    // best aligned reference of every pending sample: (|scalar part|, index)
    let mut reference = vec![(f64::NEG_INFINITY, 0usize); n];
    aligned[0] = true;
    let mut last = 0;

    for _ in 1..n {
        for i in (0..n).filter(|&i| !aligned[i]) {
            let score = robots_reversed[i]
                .real
                .dot(&robots_reversed[last].real)
                .abs();
            if score > reference[i].0 {
                reference[i] = (score, last);
            }
        }

        let Some(next) = (0..n)
            .filter(|&i| !aligned[i])
            .max_by(|&a, &b| reference[a].0.total_cmp(&reference[b].0))
        else {
            break;
        };

        let (score, j) = reference[next];
        if score < SIGN_AMBIGUITY {
            log::warn!(
                "sign of camera pose {} is ambiguous: closest reference {} is a half turn away",
                next,
                j
            );
        }

        cameras[next] = align_camera_sign(
            &cameras[next],
            &robots_reversed[next],
            (&cameras[j], &robots_reversed[j]),
        );
        aligned[next] = true;
        last = next;
    }
}

/// Stack the constraint blocks of all correspondences into one `(8n) x 16` matrix.
///
/// The robot pose is built from its Euler angles and reversed, the camera pose from its
/// Rodrigues vector. Camera signs are aligned with [`align_camera_signs`].
pub fn build_constraint_matrix(correspondences: &[Correspondence]) -> faer::Mat<f64> {
    let mut mat = faer::Mat::<f64>::zeros(correspondences.len() * ROWS_PER_SAMPLE, NUM_UNKNOWNS);

    let robots = correspondences
        .iter()
        .map(|c| c.robot.to_dual_quaternion().conjugate_reverse())
        .collect::<Vec<_>>();
    let mut cameras = correspondences
        .iter()
        .map(|c| c.camera.to_dual_quaternion())
        .collect::<Vec<_>>();
    align_camera_signs(&mut cameras, &robots);

    for (i, (camera, robot)) in cameras.iter().zip(robots.iter()).enumerate() {
        let block = constraint_block(camera, robot);

        for (r, row) in block.iter().enumerate() {
            for (col, &value) in row.iter().enumerate() {
                mat.write(i * ROWS_PER_SAMPLE + r, col, value);
            }
        }
    }

    log::debug!(
        "constraint matrix: {} x {} from {} correspondences",
        mat.nrows(),
        mat.ncols(),
        correspondences.len()
    );

    mat
}

fn matmul44(a: &[[f64; 4]; 4], b: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
    let mut m = [[0.0; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    m
}

fn add44(a: &[[f64; 4]; 4], b: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
    let mut m = *a;
    for (row, rhs) in m.iter_mut().zip(b.iter()) {
        for (val, r) in row.iter_mut().zip(rhs.iter()) {
            *val += r;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correspondence::{CameraPose, RobotPose};
    use approx::assert_relative_eq;
    use handeye_algebra::Quaternion;

    fn transform(rvec: [f64; 3], t: [f64; 3]) -> DualQuaternion {
        DualQuaternion::from_rotation_translation(Quaternion::from_axis_angle_vector(&rvec), &t)
    }

    fn apply(block: &[[f64; NUM_UNKNOWNS]; ROWS_PER_SAMPLE], x: &[f64; NUM_UNKNOWNS]) -> [f64; 8] {
        let mut out = [0.0; 8];
        for (o, row) in out.iter_mut().zip(block.iter()) {
            *o = row.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }

    fn unknowns(g: &DualQuaternion, r: &DualQuaternion) -> [f64; NUM_UNKNOWNS] {
        let mut x = [0.0; NUM_UNKNOWNS];
        x[..8].copy_from_slice(&g.to_array());
        x[8..].copy_from_slice(&r.to_array());
        x
    }

    #[test]
    fn test_block_vanishes_on_consistent_transforms() {
        let c = transform([0.3, -0.2, 0.9], [1.0, 2.0, -0.5]);
        let t = transform([-1.1, 0.4, 0.2], [0.2, -3.0, 1.5]);
        let g = transform([0.5, 0.5, -0.1], [0.1, 0.0, 0.3]);
        let r = c * g * t;

        let block = constraint_block(&c, &t);
        for residual in apply(&block, &unknowns(&g, &r)) {
            assert_relative_eq!(residual, 0.0, epsilon = 1e-12);
        }

        // the companion null vector [0, g.real, 0, r.real] also satisfies the block
        let mut companion = [0.0; NUM_UNKNOWNS];
        companion[4..8].copy_from_slice(&g.real.to_array());
        companion[12..].copy_from_slice(&r.real.to_array());
        for residual in apply(&block, &companion) {
            assert_relative_eq!(residual, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_block_rejects_inconsistent_transforms() {
        let c = transform([0.3, -0.2, 0.9], [1.0, 2.0, -0.5]);
        let t = transform([-1.1, 0.4, 0.2], [0.2, -3.0, 1.5]);
        let g = transform([0.5, 0.5, -0.1], [0.1, 0.0, 0.3]);
        let r = transform([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]);

        let block = constraint_block(&c, &t);
        let norm: f64 = apply(&block, &unknowns(&g, &r))
            .iter()
            .map(|v| v * v)
            .sum();
        assert!(norm > 1e-3);
    }

    #[test]
    fn test_align_camera_sign() {
        let g = transform([0.5, 0.5, -0.1], [0.1, 0.0, 0.3]);
        let r = transform([-0.2, 0.7, 1.3], [2.0, -1.0, 0.5]);
        let t0 = transform([-1.1, 0.4, 0.2], [0.2, -3.0, 1.5]);
        let t1 = transform([0.9, -0.3, 2.5], [1.0, 1.0, 0.0]);
        let c0 = r * t0.conjugate_reverse() * g.conjugate_reverse();
        let c1 = r * t1.conjugate_reverse() * g.conjugate_reverse();

        let flipped = DualQuaternion::new(-c1.real, -c1.dual);
        assert_eq!(align_camera_sign(&c1, &t1, (&c0, &t0)), c1);
        assert_eq!(align_camera_sign(&flipped, &t1, (&c0, &t0)), c1);

        let block = constraint_block(&align_camera_sign(&flipped, &t1, (&c0, &t0)), &t1);
        for residual in apply(&block, &unknowns(&g, &r)) {
            assert_relative_eq!(residual, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_align_camera_signs_through_best_reference() {
        let g = transform([0.5, 0.5, -0.1], [0.1, 0.0, 0.3]);
        let r = transform([-0.2, 0.7, 1.3], [2.0, -1.0, 0.5]);

        // the second robot rotation is a half turn about Z away from the first one
        let t0 = transform([0.3, -0.5, 0.2], [0.2, -3.0, 1.5]);
        let robots = [
            t0,
            transform([0.0, 0.0, std::f64::consts::PI], [1.0, 0.0, -1.0]) * t0,
            transform([1.0, 0.4, -0.6], [0.5, 0.5, 0.0]),
            transform([-0.7, 0.9, 1.2], [-1.0, 2.0, 0.3]),
        ];
        assert!(robots[1].real.dot(&robots[0].real).abs() < 1e-12);

        for flips in [[false, true, false, true], [true, false, true, false]] {
            let mut cameras = robots
                .iter()
                .zip(flips.iter())
                .map(|(t, &flip)| {
                    let c = r * t.conjugate_reverse() * g.conjugate_reverse();
                    if flip {
                        DualQuaternion::new(-c.real, -c.dual)
                    } else {
                        c
                    }
                })
                .collect::<Vec<_>>();
            let first = cameras[0];

            align_camera_signs(&mut cameras, &robots);
            assert_eq!(cameras[0], first);

            // a negated reference camera pairs with a negated tool offset
            let mut x = unknowns(&g, &r);
            if flips[0] {
                x[..8].iter_mut().for_each(|v| *v = -*v);
            }
            for (camera, robot) in cameras.iter().zip(robots.iter()) {
                for residual in apply(&constraint_block(camera, robot), &x) {
                    assert_relative_eq!(residual, 0.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_block_identity_structure() {
        let block = constraint_block(&DualQuaternion::IDENTITY, &DualQuaternion::IDENTITY);
        for i in 0..4 {
            for j in 0..NUM_UNKNOWNS {
                let expected = match j {
                    _ if j == i => 1.0,
                    _ if j == 8 + i => -1.0,
                    _ => 0.0,
                };
                assert_eq!(block[i][j], expected);

                let expected = match j {
                    _ if j == 4 + i => 1.0,
                    _ if j == 12 + i => -1.0,
                    _ => 0.0,
                };
                assert_eq!(block[4 + i][j], expected);
            }
        }
    }

    #[test]
    fn test_build_constraint_matrix_stacks_blocks() {
        let correspondences = vec![
            Correspondence {
                robot: RobotPose {
                    translation: [0.0, 0.0, 0.0],
                    euler_angles: [0.0, 0.0, 0.0],
                },
                camera: CameraPose {
                    translation: [0.0, 0.0, 0.0],
                    rotation_vector: [0.0, 0.0, 0.0],
                },
            },
            Correspondence {
                robot: RobotPose {
                    translation: [1.0, 2.0, 3.0],
                    euler_angles: [0.1, 0.2, 0.3],
                },
                camera: CameraPose {
                    translation: [-1.0, 0.5, 2.0],
                    rotation_vector: [0.3, 0.2, 0.1],
                },
            },
        ];

        let mat = build_constraint_matrix(&correspondences);
        assert_eq!(mat.nrows(), 16);
        assert_eq!(mat.ncols(), NUM_UNKNOWNS);

        let camera = correspondences[1].camera.to_dual_quaternion();
        let robot = correspondences[1].robot.to_dual_quaternion().conjugate_reverse();
        let block = constraint_block(&camera, &robot);
        for r in 0..ROWS_PER_SAMPLE {
            for c in 0..NUM_UNKNOWNS {
                assert_eq!(mat.read(ROWS_PER_SAMPLE + r, c), block[r][c]);
            }
        }
        assert_eq!(mat.read(0, 0), 1.0);
        assert_eq!(mat.read(0, 8), -1.0);
    }
}
