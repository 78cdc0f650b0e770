//! Core geometric types for square-marker pose estimation.
//!
//! This crate is intentionally small and purely geometric: camera intrinsics,
//! lens distortion, the marker square model, the pose type and point
//! projection. It does *not* depend on any image type or concrete solver.

mod camera;
mod error;
mod logger;
mod marker;
mod pose;

pub use camera::{project_points, CameraIntrinsics, DistortionCoeffs};
pub use error::PoseError;
pub use marker::{MarkerSquare, SquareCorrespondences, MARKER_CORNER_COUNT};
pub use pose::Pose;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
