use log::{debug, trace};
use marker_pose_core::{
    project_points, CameraIntrinsics, DistortionCoeffs, Pose, PoseError, SquareCorrespondences,
    MARKER_CORNER_COUNT,
};
use nalgebra::{Matrix3, Point2, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::homography::homography_from_square;

/// Tuning knobs for the planar-square solver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Orthogonal-iteration refinement steps per candidate.
    pub refine_iters: usize,
    /// Minimum rotation angle (radians) separating the two candidates for
    /// the alternate to count as a distinct solution.
    pub min_ambiguity_angle: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            refine_iters: 50,
            min_ambiguity_angle: 0.1,
        }
    }
}

/// Both local minima of a planar solve, best first.
///
/// A flat target observed by a single camera admits up to two geometrically
/// distinct poses with near-identical projections. The solver always returns
/// the lower-reprojection-error candidate as [`PoseSolution::pose`] and keeps
/// the other one around so callers can gate on [`PoseSolution::ambiguity_ratio`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseSolution {
    pub best: Pose,
    /// Reprojection RMSE of `best` over the four corners, in pixels.
    pub best_rmse: f64,
    pub alternate: Option<Pose>,
    pub alternate_rmse: Option<f64>,
}

impl PoseSolution {
    /// The lowest-reprojection-error pose.
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.best
    }

    /// `best_rmse / alternate_rmse`; values near 1.0 mean the two planar
    /// minima are hard to tell apart. `None` without an alternate.
    pub fn ambiguity_ratio(&self) -> Option<f64> {
        self.alternate_rmse.map(|alt| self.best_rmse / alt.max(1e-12))
    }
}

/// Pose solver specialized for planar square markers.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanarSquareSolver {
    params: SolverParams,
}

impl PlanarSquareSolver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Solve the marker pose from the four corner correspondences.
    ///
    /// Operates in double precision throughout. Degenerate inputs are
    /// reported as [`PoseError::DegenerateGeometry`] rather than letting a
    /// non-finite pose escape.
    pub fn solve(
        &self,
        intrinsics: &CameraIntrinsics,
        distortion: &DistortionCoeffs,
        correspondences: &SquareCorrespondences,
    ) -> Result<PoseSolution, PoseError> {
        let k_inv = intrinsics.try_inverse()?;

        // Undistorted normalized image coordinates of the four corners.
        let pixels = correspondences.image_points();
        let mut norm = [Point2::origin(); MARKER_CORNER_COUNT];
        for (n, p) in norm.iter_mut().zip(pixels) {
            let v = k_inv * Vector3::new(p.x, p.y, 1.0);
            *n = distortion.undistort(Point2::new(v.x / v.z, v.y / v.z));
        }

        let object = correspondences.object_points();
        let plane = object.map(|p| Point2::new(p.x, p.y));

        let h = homography_from_square(&plane, &norm)?;
        let initial = decompose_homography(&h.h)?;

        let rays = norm.map(|p| Vector3::new(p.x, p.y, 1.0));
        let object_vecs = object.map(|p| p.coords);

        let first = refine(&rays, &object_vecs, initial, self.params.refine_iters)?;
        let first_rmse = reprojection_rmse(&first, intrinsics, distortion, &object, pixels);
        if !first.is_finite() || !first_rmse.is_finite() {
            return Err(PoseError::DegenerateGeometry {
                reason: "refinement produced a non-finite pose",
            });
        }
        trace!("primary candidate rmse = {first_rmse:.6} px");

        let second = self
            .mirrored_candidate(&first)
            .and_then(|seed| refine(&rays, &object_vecs, seed, self.params.refine_iters).ok())
            .filter(|p| p.is_finite())
            // Refinement may fall back into the first minimum.
            .filter(|p| p.rotation.rotation_to(&first.rotation).angle() > self.params.min_ambiguity_angle);

        let solution = match second {
            Some(alt) => {
                let alt_rmse = reprojection_rmse(&alt, intrinsics, distortion, &object, pixels);
                trace!("alternate candidate rmse = {alt_rmse:.6} px");
                if alt_rmse.is_finite() && alt_rmse < first_rmse {
                    PoseSolution {
                        best: alt,
                        best_rmse: alt_rmse,
                        alternate: Some(first),
                        alternate_rmse: Some(first_rmse),
                    }
                } else if alt_rmse.is_finite() {
                    PoseSolution {
                        best: first,
                        best_rmse: first_rmse,
                        alternate: Some(alt),
                        alternate_rmse: Some(alt_rmse),
                    }
                } else {
                    PoseSolution {
                        best: first,
                        best_rmse: first_rmse,
                        alternate: None,
                        alternate_rmse: None,
                    }
                }
            }
            None => PoseSolution {
                best: first,
                best_rmse: first_rmse,
                alternate: None,
                alternate_rmse: None,
            },
        };

        debug!(
            "planar solve: rmse = {:.6} px, distinct alternate: {}",
            solution.best_rmse,
            solution.alternate.is_some()
        );
        Ok(solution)
    }

    /// Second-minimum seed: the pose mirrored by a half-turn about the
    /// viewing axis through the marker center (Schweighofer-Pinz).
    fn mirrored_candidate(&self, pose: &Pose) -> Option<Pose> {
        let norm = pose.translation.norm();
        if norm <= 1e-12 {
            return None;
        }
        let n = pose.translation / norm;
        let half_turn = 2.0 * (n * n.transpose()) - Matrix3::identity();
        let mirrored = project_to_so3(&(half_turn * pose.rotation.into_inner())).ok()?;
        if mirrored.rotation_to(&pose.rotation).angle() < self.params.min_ambiguity_angle {
            return None;
        }
        Some(Pose::new(mirrored, pose.translation))
    }
}

/// Pose from a plane-to-normalized-image homography `H = [r1 r2 t]`.
fn decompose_homography(h: &Matrix3<f64>) -> Result<Pose, PoseError> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let n1 = h1.norm();
    let n2 = h2.norm();
    if n1 <= 1e-12 || n2 <= 1e-12 {
        return Err(PoseError::DegenerateGeometry {
            reason: "vanishing homography columns",
        });
    }
    let lambda = 2.0 / (n1 + n2);

    let mut r1 = h1 * lambda;
    let mut r2 = h2 * lambda;
    let mut t = h3 * lambda;
    // The marker must sit in front of the camera.
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    let r3 = r1.cross(&r2);
    if r3.norm() <= 1e-12 {
        return Err(PoseError::DegenerateGeometry {
            reason: "homography columns are parallel",
        });
    }

    let mut m = Matrix3::zeros();
    m.set_column(0, &r1);
    m.set_column(1, &r2);
    m.set_column(2, &r3);
    Ok(Pose::new(project_to_so3(&m)?, t))
}

/// Nearest rotation in the Frobenius sense: SVD with determinant correction.
fn project_to_so3(m: &Matrix3<f64>) -> Result<Rotation3<f64>, PoseError> {
    let svd = m.svd(true, true);
    let u = svd.u.ok_or(PoseError::DegenerateGeometry {
        reason: "rotation projection failed",
    })?;
    let v_t = svd.v_t.ok_or(PoseError::DegenerateGeometry {
        reason: "rotation projection failed",
    })?;
    let r = u * v_t;
    let r = if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        u_flipped * v_t
    } else {
        r
    };
    Ok(Rotation3::from_matrix_unchecked(r))
}

/// Orthogonal iteration (Lu et al. 2000) over the four viewing rays,
/// minimizing the object-space error.
fn refine(
    rays: &[Vector3<f64>; MARKER_CORNER_COUNT],
    object: &[Vector3<f64>; MARKER_CORNER_COUNT],
    seed: Pose,
    iters: usize,
) -> Result<Pose, PoseError> {
    let n = MARKER_CORNER_COUNT as f64;

    // Line-of-sight projection operators F_i = v v^T / (v^T v).
    let mut f_ops = [Matrix3::zeros(); MARKER_CORNER_COUNT];
    let mut f_mean = Matrix3::zeros();
    for (f, v) in f_ops.iter_mut().zip(rays) {
        let d = v.dot(v);
        if d <= 1e-12 {
            return Err(PoseError::DegenerateGeometry {
                reason: "vanishing viewing ray",
            });
        }
        *f = v * v.transpose() / d;
        f_mean += *f;
    }
    f_mean /= n;

    let m_inv = (Matrix3::identity() - f_mean)
        .try_inverse()
        .ok_or(PoseError::DegenerateGeometry {
            reason: "ill-conditioned ray bundle",
        })?;

    let obj_mean: Vector3<f64> = object.iter().sum::<Vector3<f64>>() / n;

    let mut r = seed.rotation;
    let mut t = seed.translation;

    for _ in 0..iters {
        // Optimal translation for the current rotation.
        let mut acc = Vector3::zeros();
        for (f, p) in f_ops.iter().zip(object) {
            let rp = r * p;
            acc += f * rp - rp;
        }
        t = m_inv * (acc / n);

        // Optimal rotation via SVD of the cross-covariance.
        let mut q = [Vector3::zeros(); MARKER_CORNER_COUNT];
        let mut q_mean = Vector3::zeros();
        for i in 0..MARKER_CORNER_COUNT {
            q[i] = f_ops[i] * (r * object[i] + t);
            q_mean += q[i];
        }
        q_mean /= n;

        let mut cov = Matrix3::zeros();
        for i in 0..MARKER_CORNER_COUNT {
            cov += (q[i] - q_mean) * (object[i] - obj_mean).transpose();
        }
        r = project_to_so3(&cov)?;
    }

    Ok(Pose::new(r, t))
}

/// Pixel-space reprojection RMSE of `pose` over the marker corners.
fn reprojection_rmse(
    pose: &Pose,
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionCoeffs,
    object: &[Point3<f64>; MARKER_CORNER_COUNT],
    pixels: &[Point2<f64>; MARKER_CORNER_COUNT],
) -> f64 {
    let projected = project_points(pose, intrinsics, distortion, object);
    let sum_sq: f64 = projected
        .iter()
        .zip(pixels)
        .map(|(a, b)| (a - b).norm_squared())
        .sum();
    (sum_sq / MARKER_CORNER_COUNT as f64).sqrt()
}
