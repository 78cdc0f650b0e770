use nalgebra::{Matrix3, Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::{Pose, PoseError};

/// Epsilon added to camera-space depth before the perspective divide.
const PROJECTION_EPS: f64 = 1.0e-9;

/// Fixed-point rounds used to invert the distortion model.
const UNDISTORT_ITERS: usize = 8;

/// Pinhole camera intrinsic matrix.
///
/// Row-major semantics: `[[fx, skew, cx], [0, fy, cy], [0, 0, 1]]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub k: Matrix3<f64>,
}

impl CameraIntrinsics {
    pub fn new(k: Matrix3<f64>) -> Self {
        Self { k }
    }

    /// Build from focal lengths and principal point, zero skew.
    pub fn from_params(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self::new(Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0))
    }

    /// Build from a row-major 9-element array.
    pub fn from_row_array(data: &[f64; 9]) -> Self {
        Self::new(Matrix3::from_row_slice(data))
    }

    pub fn to_row_array(&self) -> [f64; 9] {
        [
            self.k[(0, 0)],
            self.k[(0, 1)],
            self.k[(0, 2)],
            self.k[(1, 0)],
            self.k[(1, 1)],
            self.k[(1, 2)],
            self.k[(2, 0)],
            self.k[(2, 1)],
            self.k[(2, 2)],
        ]
    }

    #[inline]
    pub fn fx(&self) -> f64 {
        self.k[(0, 0)]
    }

    #[inline]
    pub fn fy(&self) -> f64 {
        self.k[(1, 1)]
    }

    #[inline]
    pub fn cx(&self) -> f64 {
        self.k[(0, 2)]
    }

    #[inline]
    pub fn cy(&self) -> f64 {
        self.k[(1, 2)]
    }

    #[inline]
    pub fn skew(&self) -> f64 {
        self.k[(0, 1)]
    }

    /// `K^{-1}`, or [`PoseError::SingularIntrinsics`] when the matrix cannot
    /// be inverted.
    pub fn try_inverse(&self) -> Result<Matrix3<f64>, PoseError> {
        self.k.try_inverse().ok_or(PoseError::SingularIntrinsics)
    }

    /// Map a normalized image point to pixel coordinates.
    #[inline]
    pub fn pixel_from_normalized(&self, n: Point2<f64>) -> Point2<f64> {
        Point2::new(
            self.fx() * n.x + self.skew() * n.y + self.cx(),
            self.fy() * n.y + self.cy(),
        )
    }
}

/// Brown-Conrady lens distortion, OpenCV coefficient order
/// `[k1, k2, p1, p2, k3]`.
///
/// The zero vector reproduces the plain pinhole model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionCoeffs {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl DistortionCoeffs {
    pub const ZERO: Self = Self {
        k1: 0.0,
        k2: 0.0,
        p1: 0.0,
        p2: 0.0,
        k3: 0.0,
    };

    pub fn from_array(c: &[f64; 5]) -> Self {
        Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
            k3: c[4],
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Apply the forward distortion model to a normalized image point.
    pub fn distort(&self, p: Point2<f64>) -> Point2<f64> {
        if self.is_zero() {
            return p;
        }
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let xd = x * radial + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * radial + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        Point2::new(xd, yd)
    }

    /// Invert the distortion model by fixed-point iteration.
    pub fn undistort(&self, p: Point2<f64>) -> Point2<f64> {
        if self.is_zero() {
            return p;
        }
        let mut x = p.x;
        let mut y = p.y;
        for _ in 0..UNDISTORT_ITERS {
            let r2 = x * x + y * y;
            let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
            let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
            x = (p.x - dx) / radial;
            y = (p.y - dy) / radial;
        }
        Point2::new(x, y)
    }
}

/// Project marker-local 3D points to pixel coordinates through `pose`,
/// `distortion` and `intrinsics`.
///
/// One output point per input point. Points projecting outside the visible
/// frame are returned as-is; clipping is the renderer's concern.
pub fn project_points(
    pose: &Pose,
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionCoeffs,
    points: &[Point3<f64>],
) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| {
            let pc = pose.transform_point(p);
            let z = pc.z + PROJECTION_EPS;
            let n = distortion.distort(Point2::new(pc.x / z, pc.y / z));
            intrinsics.pixel_from_normalized(n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3 as V3};

    #[test]
    fn params_round_trip_through_row_array() {
        let k = CameraIntrinsics::from_params(800.0, 780.0, 320.0, 240.0);
        let restored = CameraIntrinsics::from_row_array(&k.to_row_array());
        assert_eq!(k, restored);
        assert_eq!(restored.fx(), 800.0);
        assert_eq!(restored.fy(), 780.0);
        assert_eq!(restored.cx(), 320.0);
        assert_eq!(restored.cy(), 240.0);
        assert_eq!(restored.skew(), 0.0);
    }

    #[test]
    fn singular_intrinsics_are_rejected() {
        let k = CameraIntrinsics::new(Matrix3::zeros());
        assert_eq!(k.try_inverse().unwrap_err(), PoseError::SingularIntrinsics);
    }

    #[test]
    fn frontal_projection_matches_pinhole_formula() {
        let k = CameraIntrinsics::from_params(800.0, 800.0, 320.0, 240.0);
        let pose = Pose::new(Rotation3::identity(), V3::new(0.0, 0.0, 5.0));
        let proj = project_points(
            &pose,
            &k,
            &DistortionCoeffs::ZERO,
            &[Point3::new(-0.5, 0.5, 0.0), Point3::new(0.5, -0.5, 0.0)],
        );
        assert_relative_eq!(proj[0].x, 240.0, epsilon = 1e-6);
        assert_relative_eq!(proj[0].y, 320.0, epsilon = 1e-6);
        assert_relative_eq!(proj[1].x, 400.0, epsilon = 1e-6);
        assert_relative_eq!(proj[1].y, 160.0, epsilon = 1e-6);
    }

    #[test]
    fn distort_undistort_round_trips() {
        let d = DistortionCoeffs {
            k1: -0.2,
            k2: 0.05,
            p1: 0.001,
            p2: -0.001,
            k3: 0.01,
        };
        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(0.3, -0.2),
            Point2::new(-0.25, 0.4),
        ] {
            let back = d.undistort(d.distort(p));
            assert_relative_eq!(back.x, p.x, epsilon = 1e-7);
            assert_relative_eq!(back.y, p.y, epsilon = 1e-7);
        }
    }

    #[test]
    fn zero_distortion_is_a_no_op() {
        let p = Point2::new(0.7, -1.2);
        assert_eq!(DistortionCoeffs::ZERO.distort(p), p);
        assert_eq!(DistortionCoeffs::ZERO.undistort(p), p);
        assert!(DistortionCoeffs::default().is_zero());
    }
}
