use log::debug;
use nalgebra::{Point2, Point3, Vector3};

use marker_pose_core::{
    project_points, CameraIntrinsics, DistortionCoeffs, MarkerSquare, Pose, PoseError,
    SquareCorrespondences,
};
use marker_pose_overlay::{draw_closed_polyline, Rgba8ViewMut, Stroke};
use marker_pose_pnp::{PlanarSquareSolver, PoseSolution, SolverParams};

/// End-to-end marker pose estimation with a fixed camera and marker model.
///
/// Stateless across calls: every estimate is a pure function of the supplied
/// corners, and drawing mutates only the buffer borrowed for that call.
#[derive(Clone, Copy, Debug)]
pub struct PoseEstimator {
    intrinsics: CameraIntrinsics,
    distortion: DistortionCoeffs,
    marker: MarkerSquare,
    solver: PlanarSquareSolver,
}

impl PoseEstimator {
    /// An estimator with zero distortion and default solver settings.
    pub fn new(intrinsics: CameraIntrinsics, marker: MarkerSquare) -> Self {
        Self {
            intrinsics,
            distortion: DistortionCoeffs::ZERO,
            marker,
            solver: PlanarSquareSolver::default(),
        }
    }

    pub fn with_distortion(mut self, distortion: DistortionCoeffs) -> Self {
        self.distortion = distortion;
        self
    }

    pub fn with_solver_params(mut self, params: SolverParams) -> Self {
        self.solver = PlanarSquareSolver::new(params);
        self
    }

    #[inline]
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    #[inline]
    pub fn marker(&self) -> &MarkerSquare {
        &self.marker
    }

    /// Solve the marker pose from four pixel corners (marker order:
    /// top-left, top-right, bottom-right, bottom-left).
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn estimate(&self, corners: &[Point2<f64>]) -> Result<PoseSolution, PoseError> {
        let correspondences = SquareCorrespondences::new(self.marker, corners)?;
        let solution = self
            .solver
            .solve(&self.intrinsics, &self.distortion, &correspondences)?;
        let pos = solution.pose().camera_position();
        debug!("camera position: {:.4} {:.4} {:.4}", pos.x, pos.y, pos.z);
        Ok(solution)
    }

    /// Project marker-local 3D points through a solved pose.
    pub fn project(&self, pose: &Pose, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        project_points(pose, &self.intrinsics, &self.distortion, points)
    }

    /// Solve, stroke the marker outline over `img`, and return the camera
    /// position in marker coordinates.
    ///
    /// `img` is left untouched when the solve fails.
    pub fn estimate_and_draw(
        &self,
        img: &mut Rgba8ViewMut<'_>,
        corners: &[Point2<f64>],
        stroke: &Stroke,
    ) -> Result<Vector3<f64>, PoseError> {
        let solution = self.estimate(corners)?;
        let outline = self.project(solution.pose(), &self.marker.corners());
        draw_closed_polyline(img, &round_points(&outline), stroke);
        Ok(solution.pose().camera_position())
    }

    /// Solve, project an arbitrary 3D polyline and stroke it closed.
    ///
    /// `img` is left untouched when the solve fails.
    pub fn draw_projected_polyline(
        &self,
        img: &mut Rgba8ViewMut<'_>,
        corners: &[Point2<f64>],
        points: &[Point3<f64>],
        stroke: &Stroke,
    ) -> Result<(), PoseError> {
        let solution = self.estimate(corners)?;
        let projected = self.project(solution.pose(), points);
        draw_closed_polyline(img, &round_points(&projected), stroke);
        Ok(())
    }
}

/// Round projected points to integer pixel coordinates for the renderer.
pub fn round_points(pts: &[Point2<f64>]) -> Vec<[i32; 2]> {
    pts.iter()
        .map(|p| [p.x.round() as i32, p.y.round() as i32])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_pose_overlay::Rgba8Image;

    fn frontal_corners() -> [Point2<f64>; 4] {
        [
            Point2::new(240.0, 320.0),
            Point2::new(400.0, 320.0),
            Point2::new(400.0, 160.0),
            Point2::new(240.0, 160.0),
        ]
    }

    fn estimator() -> PoseEstimator {
        PoseEstimator::new(
            CameraIntrinsics::from_params(800.0, 800.0, 320.0, 240.0),
            MarkerSquare::new(1.0),
        )
    }

    #[test]
    fn estimate_and_draw_paints_the_outline_and_reports_the_camera() {
        let mut img = Rgba8Image::new(640, 480);
        let pos = estimator()
            .estimate_and_draw(&mut img.view_mut(), &frontal_corners(), &Stroke::default())
            .expect("solvable");

        assert!((pos - Vector3::new(0.0, 0.0, -5.0)).norm() < 1e-3);
        // The outline passes through the marker's projected top edge.
        assert_eq!(
            img.view().get_pixel(320, 320),
            Some(Stroke::default().color)
        );
        assert_eq!(img.view().get_pixel(320, 240), Some([0, 0, 0, 0]));
    }

    #[test]
    fn failed_solve_leaves_the_buffer_untouched() {
        let mut img = Rgba8Image::new(64, 64);
        let collinear = [
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 10.0),
            Point2::new(30.0, 10.0),
            Point2::new(40.0, 10.0),
        ];
        let err = estimator()
            .estimate_and_draw(&mut img.view_mut(), &collinear, &Stroke::default())
            .unwrap_err();
        assert!(matches!(err, PoseError::DegenerateGeometry { .. }));
        assert!(img.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn projected_polyline_lands_between_the_corners() {
        let mut img = Rgba8Image::new(640, 480);
        // A smaller square floating above the marker plane.
        let hover = [
            Point3::new(-0.25, 0.25, -0.5),
            Point3::new(0.25, 0.25, -0.5),
            Point3::new(0.25, -0.25, -0.5),
            Point3::new(-0.25, -0.25, -0.5),
        ];
        estimator()
            .draw_projected_polyline(
                &mut img.view_mut(),
                &frontal_corners(),
                &hover,
                &Stroke::default(),
            )
            .expect("solvable");
        // z = -0.5 sits nearer the camera, so the square projects larger
        // than its in-plane size: half extent 0.25/4.5 * 800 ~ 44 px.
        assert_eq!(
            img.view().get_pixel(320, 240 + 44),
            Some(Stroke::default().color)
        );
    }

    #[test]
    fn rounding_is_to_the_nearest_pixel() {
        let pts = [Point2::new(1.4, -0.6), Point2::new(2.5, 3.49)];
        assert_eq!(round_points(&pts), vec![[1, -1], [3, 3]]);
    }
}
