use marker_pose_core::PoseError;
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Plane-to-image homography `p_img ~ H * p_plane`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }
}

fn similarity_transform(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    // Hartley conditioning: centroid to the origin, mean distance sqrt(2).
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn condition_points(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= 4.0;
    cy /= 4.0;

    let mut mean_dist = 0.0;
    for p in pts {
        mean_dist += ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
    }
    mean_dist /= 4.0;

    let t = similarity_transform(cx, cy, mean_dist);
    let mut out = [Point2::origin(); 4];
    for (o, p) in out.iter_mut().zip(pts) {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        *o = Point2::new(v[0], v[1]);
    }
    (out, t)
}

/// Estimate `H` from exactly four plane-to-image correspondences.
///
/// Both point sets are conditioned before the 8x8 linear solve; the result
/// is scaled to `h33 = 1`. A singular system (collinear or coincident
/// points) is reported as degenerate geometry.
pub fn homography_from_square(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, PoseError> {
    let (src_n, t_src) = condition_points(src);
    let (dst_n, t_dst) = condition_points(dst);

    // Three collinear or coincident targets make the system rank-deficient,
    // and a partial-pivot LU cannot be trusted to flag that; check directly
    // in the conditioned (unit-scale) frame.
    for k in 0..4 {
        let a = dst_n[k];
        let b = dst_n[(k + 1) % 4];
        let c = dst_n[(k + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < 1e-9 {
            return Err(PoseError::DegenerateGeometry {
                reason: "collinear corner targets",
            });
        }
    }

    // Unknowns [h11..h32] with h33 = 1; two rows per correspondence:
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b).ok_or(PoseError::DegenerateGeometry {
        reason: "homography system is singular",
    })?;

    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // Undo the conditioning: H = T_dst^{-1} * Hn * T_src.
    let t_dst_inv = t_dst.try_inverse().ok_or(PoseError::DegenerateGeometry {
        reason: "point conditioning is singular",
    })?;
    let h = t_dst_inv * hn * t_src;

    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return Err(PoseError::DegenerateGeometry {
            reason: "homography scale vanishes",
        });
    }
    Ok(Homography::new(h / s))
}
