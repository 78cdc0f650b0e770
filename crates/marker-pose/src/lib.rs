//! High-level facade for the `marker-pose-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the core types, the planar-square solver and the
//!   overlay renderer
//! - the end-to-end [`PoseEstimator`] pipeline
//! - a flat-array boundary ([`raw`]) matching the host-side call convention
//! - (feature `image`) adapters between `image` buffers and the overlay view
//!   types
//!
//! ## Quickstart
//!
//! ```
//! use marker_pose::{CameraIntrinsics, MarkerSquare, PoseEstimator};
//! use nalgebra::Point2;
//!
//! let intrinsics = CameraIntrinsics::from_params(800.0, 800.0, 320.0, 240.0);
//! let estimator = PoseEstimator::new(intrinsics, MarkerSquare::new(1.0));
//!
//! // Corner pixels in marker order: top-left, top-right, bottom-right,
//! // bottom-left.
//! let corners = [
//!     Point2::new(240.0, 320.0),
//!     Point2::new(400.0, 320.0),
//!     Point2::new(400.0, 160.0),
//!     Point2::new(240.0, 160.0),
//! ];
//! let solution = estimator.estimate(&corners)?;
//! println!("camera at {:?}", solution.pose().camera_position());
//! # Ok::<(), marker_pose::PoseError>(())
//! ```
//!
//! ## API map
//! - `marker_pose::core`: intrinsics, distortion, marker model, pose.
//! - `marker_pose::pnp`: the planar-square solver.
//! - `marker_pose::overlay`: buffer views, polylines, labels.
//! - `marker_pose::raw`: flat-array entry points.

pub use marker_pose_core as core;
pub use marker_pose_overlay as overlay;
pub use marker_pose_pnp as pnp;

pub use marker_pose_core::{
    project_points, CameraIntrinsics, DistortionCoeffs, MarkerSquare, Pose, PoseError,
    SquareCorrespondences, MARKER_CORNER_COUNT,
};
pub use marker_pose_overlay::{
    draw_closed_polyline, draw_label, rgba_to_gray, GrayImage, LabelOrientation, LabelStyle,
    Rgba8Image, Rgba8View, Rgba8ViewMut, Stroke,
};
pub use marker_pose_pnp::{PlanarSquareSolver, PoseSolution, SolverParams};

mod pipeline;
pub mod raw;

pub use pipeline::{round_points, PoseEstimator};

#[cfg(feature = "image")]
pub mod convert;
