use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marker_pose::{
    project_points, CameraIntrinsics, DistortionCoeffs, MarkerSquare, Pose, PoseEstimator,
};
use nalgebra::{Point2, Rotation3, Vector3};

fn corners_for(pose: &Pose, intrinsics: &CameraIntrinsics, marker: &MarkerSquare) -> [Point2<f64>; 4] {
    let projected = project_points(pose, intrinsics, &DistortionCoeffs::ZERO, &marker.corners());
    [projected[0], projected[1], projected[2], projected[3]]
}

fn bench_solve(c: &mut Criterion) {
    let intrinsics = CameraIntrinsics::from_params(800.0, 800.0, 320.0, 240.0);
    let marker = MarkerSquare::new(1.0);
    let estimator = PoseEstimator::new(intrinsics, marker);

    let frontal = corners_for(
        &Pose::new(Rotation3::identity(), Vector3::new(0.0, 0.0, 5.0)),
        &intrinsics,
        &marker,
    );
    let oblique = corners_for(
        &Pose::new(
            Rotation3::from_euler_angles(0.3, 0.6, -0.2),
            Vector3::new(0.4, -0.2, 3.0),
        ),
        &intrinsics,
        &marker,
    );

    c.bench_function("solve_frontal_square", |b| {
        b.iter(|| estimator.estimate(black_box(&frontal)))
    });
    c.bench_function("solve_oblique_square", |b| {
        b.iter(|| estimator.estimate(black_box(&oblique)))
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
