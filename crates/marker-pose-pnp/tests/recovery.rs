//! Round-trip recovery over a deterministic sweep of synthetic poses.

use marker_pose_core::{
    project_points, CameraIntrinsics, DistortionCoeffs, MarkerSquare, Pose, SquareCorrespondences,
};
use marker_pose_pnp::PlanarSquareSolver;
use nalgebra::{Point2, Rotation3, Vector3};

fn recover(truth: &Pose, intrinsics: &CameraIntrinsics, marker: &MarkerSquare) -> Pose {
    let projected = project_points(truth, intrinsics, &DistortionCoeffs::ZERO, &marker.corners());
    let corners: [Point2<f64>; 4] = [projected[0], projected[1], projected[2], projected[3]];
    let correspondences = SquareCorrespondences::new(*marker, &corners).expect("valid quad");
    *PlanarSquareSolver::default()
        .solve(intrinsics, &DistortionCoeffs::ZERO, &correspondences)
        .expect("solvable")
        .pose()
}

#[test]
fn pose_sweep_round_trips_within_tolerance() {
    let intrinsics = CameraIntrinsics::from_params(700.0, 700.0, 320.0, 240.0);
    let marker = MarkerSquare::new(0.4);

    for &roll in &[-0.3, 0.0, 0.25] {
        for &pitch in &[-0.5, 0.1, 0.45] {
            for &yaw in &[-0.2, 0.3] {
                for &z in &[1.5, 4.0] {
                    let truth = Pose::new(
                        Rotation3::from_euler_angles(roll, pitch, yaw),
                        Vector3::new(0.1 * yaw.signum(), -0.05, z),
                    );
                    let solved = recover(&truth, &intrinsics, &marker);

                    let angle = solved.rotation.rotation_to(&truth.rotation).angle();
                    let t_err = (solved.translation - truth.translation).norm();
                    assert!(
                        angle < 1e-3 && t_err < 1e-3,
                        "roll={roll} pitch={pitch} yaw={yaw} z={z}: angle={angle:.2e} t_err={t_err:.2e}"
                    );
                }
            }
        }
    }
}

#[test]
fn camera_position_matches_the_analytic_inverse_across_the_sweep() {
    let intrinsics = CameraIntrinsics::from_params(650.0, 660.0, 300.0, 260.0);
    let marker = MarkerSquare::new(0.25);

    for &pitch in &[-0.4, 0.0, 0.35] {
        let truth = Pose::new(
            Rotation3::from_euler_angles(0.1, pitch, -0.15),
            Vector3::new(0.05, 0.1, 2.0),
        );
        let solved = recover(&truth, &intrinsics, &marker);
        let expected = -(truth.rotation.transpose() * truth.translation);
        assert!((solved.camera_position() - expected).norm() < 1e-3);
    }
}
