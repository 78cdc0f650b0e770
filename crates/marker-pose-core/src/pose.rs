use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid transform taking marker-local coordinates into the camera frame.
///
/// Computed fresh per solve; never retained between calls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl Pose {
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Rotation3::identity(), Vector3::zeros())
    }

    /// Build from an axis-angle (Rodrigues) vector and a translation.
    pub fn from_rvec_tvec(rvec: Vector3<f64>, tvec: Vector3<f64>) -> Self {
        Self::new(Rotation3::from_scaled_axis(rvec), tvec)
    }

    /// Axis-angle (Rodrigues) encoding of the rotation.
    pub fn rvec(&self) -> Vector3<f64> {
        self.rotation.scaled_axis()
    }

    /// Map a marker-local point into the camera frame.
    #[inline]
    pub fn transform_point(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.rotation * p.coords + self.translation
    }

    /// Camera position expressed in marker-local coordinates.
    ///
    /// For a marker-to-camera transform `(R, t)` the camera center sits at
    /// `-R^T t`; the transpose is the exact inverse of a rotation.
    pub fn camera_position(&self) -> Vector3<f64> {
        -(self.rotation.transpose() * self.translation)
    }

    /// True when every entry of the pose is finite.
    pub fn is_finite(&self) -> bool {
        self.rotation.matrix().iter().all(|v| v.is_finite())
            && self.translation.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_pose_puts_camera_at_origin() {
        assert_eq!(Pose::identity().camera_position(), Vector3::zeros());
    }

    #[test]
    fn camera_position_inverts_the_extrinsics() {
        let pose = Pose::new(
            Rotation3::from_euler_angles(0.2, -0.1, 0.4),
            Vector3::new(0.3, -0.7, 4.0),
        );
        let pos = pose.camera_position();
        // Mapping the camera center through the pose must land on the camera
        // origin.
        let back = pose.rotation * pos + pose.translation;
        assert_relative_eq!(back.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rvec_round_trips() {
        let rvec = Vector3::new(0.1, -0.2, 0.3);
        let pose = Pose::from_rvec_tvec(rvec, Vector3::zeros());
        assert_relative_eq!((pose.rvec() - rvec).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn frontal_marker_camera_position() {
        let pose = Pose::new(Rotation3::identity(), Vector3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(
            (pose.camera_position() - Vector3::new(0.0, 0.0, -5.0)).norm(),
            0.0,
            epsilon = 1e-12
        );
    }
}
