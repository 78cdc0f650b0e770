/// Errors surfaced by pose estimation.
///
/// Every failure is synchronous and reported to the caller; no variant is
/// recoverable by retrying with the same inputs.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseError {
    #[error("expected {expected} image corners, got {got}")]
    InvalidCorrespondenceCount { expected: usize, got: usize },
    #[error("degenerate corner geometry: {reason}")]
    DegenerateGeometry { reason: &'static str },
    #[error("intrinsic matrix is not invertible")]
    SingularIntrinsics,
}
