//! Planar-square pose estimation.
//!
//! Recovers the camera-relative pose of a square fiducial marker from its
//! four observed corner pixels. The solve is specialized for the planar
//! square: a 4-point homography gives the initial pose, orthogonal iteration
//! refines it, and the two-fold ambiguity every flat target suffers from is
//! resolved by refining a second candidate mirrored about the viewing axis
//! and keeping the lower-reprojection-error solution.

mod homography;
mod solver;

pub use homography::{homography_from_square, Homography};
pub use solver::{PlanarSquareSolver, PoseSolution, SolverParams};
