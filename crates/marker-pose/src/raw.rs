//! Flat-array boundary matching the host-side call convention.
//!
//! Corner arrays are 8 doubles (four `x, y` pixel pairs in marker order),
//! intrinsic arrays are 9 doubles row-major, draw arrays are `3 * N` doubles
//! and positions come back as 3 doubles. Everything crosses by value;
//! nothing is retained between calls, and an output buffer is never touched
//! when validation or the solve fails.

use nalgebra::{Point2, Point3};

use marker_pose_core::{CameraIntrinsics, MarkerSquare, PoseError};
use marker_pose_overlay::{
    draw_closed_polyline, draw_label, LabelOrientation, LabelStyle, Rgba8ViewMut, Stroke,
};
use marker_pose_pnp::PoseSolution;

use crate::pipeline::{round_points, PoseEstimator};

/// Errors raised at the flat-array boundary.
#[derive(thiserror::Error, Debug)]
pub enum RawError {
    #[error("invalid corner array length (expected {expected}, got {got})")]
    InvalidCornerArray { expected: usize, got: usize },
    #[error("invalid intrinsic array length (expected 9, got {got})")]
    InvalidIntrinsicArray { got: usize },
    #[error("invalid point array length (expected a multiple of {stride}, got {got})")]
    InvalidPointArray { stride: usize, got: usize },
    #[error(transparent)]
    Pose(#[from] PoseError),
}

fn corners_from_flat(arr: &[f64]) -> Result<[Point2<f64>; 4], RawError> {
    if arr.len() != 8 {
        return Err(RawError::InvalidCornerArray {
            expected: 8,
            got: arr.len(),
        });
    }
    Ok([
        Point2::new(arr[0], arr[1]),
        Point2::new(arr[2], arr[3]),
        Point2::new(arr[4], arr[5]),
        Point2::new(arr[6], arr[7]),
    ])
}

fn intrinsics_from_flat(arr: &[f64]) -> Result<CameraIntrinsics, RawError> {
    let data: &[f64; 9] = arr
        .try_into()
        .map_err(|_| RawError::InvalidIntrinsicArray { got: arr.len() })?;
    Ok(CameraIntrinsics::from_row_array(data))
}

fn points3_from_flat(arr: &[f64]) -> Result<Vec<Point3<f64>>, RawError> {
    if arr.len() % 3 != 0 {
        return Err(RawError::InvalidPointArray {
            stride: 3,
            got: arr.len(),
        });
    }
    Ok(arr
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}

/// Solve the marker pose from flat corner and intrinsic arrays.
pub fn solve_pose(
    corners: &[f64],
    intrinsics: &[f64],
    marker: MarkerSquare,
) -> Result<PoseSolution, RawError> {
    let corners = corners_from_flat(corners)?;
    let estimator = PoseEstimator::new(intrinsics_from_flat(intrinsics)?, marker);
    Ok(estimator.estimate(&corners)?)
}

/// Solve the pose, stroke the marker outline over `img`, and return the
/// camera position as `[x, y, z]` in marker coordinates.
pub fn estimate_and_draw(
    img: &mut Rgba8ViewMut<'_>,
    corners: &[f64],
    intrinsics: &[f64],
    marker: MarkerSquare,
    stroke: &Stroke,
) -> Result<[f64; 3], RawError> {
    let corners = corners_from_flat(corners)?;
    let estimator = PoseEstimator::new(intrinsics_from_flat(intrinsics)?, marker);
    let pos = estimator.estimate_and_draw(img, &corners, stroke)?;
    Ok([pos.x, pos.y, pos.z])
}

/// Solve the pose and stroke an arbitrary projected 3D polyline, closed.
pub fn draw_projected_polyline(
    img: &mut Rgba8ViewMut<'_>,
    corners: &[f64],
    intrinsics: &[f64],
    draw_points: &[f64],
    marker: MarkerSquare,
    stroke: &Stroke,
) -> Result<(), RawError> {
    let corners = corners_from_flat(corners)?;
    let points = points3_from_flat(draw_points)?;
    let estimator = PoseEstimator::new(intrinsics_from_flat(intrinsics)?, marker);
    estimator.draw_projected_polyline(img, &corners, &points, stroke)?;
    Ok(())
}

/// Draw a closed polyline from flat `x, y` pixel pairs.
pub fn draw_polylines(
    img: &mut Rgba8ViewMut<'_>,
    points: &[f64],
    stroke: &Stroke,
) -> Result<(), RawError> {
    if points.len() % 2 != 0 {
        return Err(RawError::InvalidPointArray {
            stride: 2,
            got: points.len(),
        });
    }
    let pts: Vec<Point2<f64>> = points
        .chunks_exact(2)
        .map(|c| Point2::new(c[0], c[1]))
        .collect();
    draw_closed_polyline(img, &round_points(&pts), stroke);
    Ok(())
}

/// Draw an oriented text label at an integer pixel position.
pub fn put_label(
    img: &mut Rgba8ViewMut<'_>,
    text: &str,
    position: &[i32; 2],
    orientation: LabelOrientation,
    style: &LabelStyle,
) {
    draw_label(img, text, *position, orientation, style);
}
