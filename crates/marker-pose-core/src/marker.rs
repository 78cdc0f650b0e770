use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::PoseError;

/// Number of corners of a square marker; every correspondence set carries
/// exactly this many points.
pub const MARKER_CORNER_COUNT: usize = 4;

/// Cross products below this magnitude mean three corners are collinear or
/// coincident.
const MIN_CORNER_CROSS: f64 = 1e-9;

/// Physical square-marker model.
///
/// Corners live on the plane `z = 0`, centered at the origin, in the order
/// top-left, top-right, bottom-right, bottom-left when the marker is viewed
/// face-on. Callers must supply image detections in the same rotational
/// order; [`SquareCorrespondences::new`] rejects quads that cannot be the
/// projection of a square, but it cannot detect a cyclic shift of an
/// otherwise valid quad.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerSquare {
    side_length: f64,
}

impl Default for MarkerSquare {
    fn default() -> Self {
        Self { side_length: 1.0 }
    }
}

impl MarkerSquare {
    /// A marker with the given physical side length (arbitrary units).
    pub fn new(side_length: f64) -> Self {
        Self { side_length }
    }

    #[inline]
    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    /// The four object-space corners, in the canonical order.
    pub fn corners(&self) -> [Point3<f64>; MARKER_CORNER_COUNT] {
        let h = self.side_length / 2.0;
        [
            Point3::new(-h, h, 0.0),
            Point3::new(h, h, 0.0),
            Point3::new(h, -h, 0.0),
            Point3::new(-h, -h, 0.0),
        ]
    }
}

/// Ordered pairing of the marker corners with their observed pixel positions.
#[derive(Clone, Debug)]
pub struct SquareCorrespondences {
    marker: MarkerSquare,
    image_points: [Point2<f64>; MARKER_CORNER_COUNT],
}

impl SquareCorrespondences {
    /// Bind image detections to the marker corners, in order.
    ///
    /// Exactly four points are required, and the quad they form must be
    /// convex with consistent winding; anything else cannot be the projection
    /// of a square and would poison the solve.
    pub fn new(marker: MarkerSquare, image_points: &[Point2<f64>]) -> Result<Self, PoseError> {
        let pts: &[Point2<f64>; MARKER_CORNER_COUNT] =
            image_points
                .try_into()
                .map_err(|_| PoseError::InvalidCorrespondenceCount {
                    expected: MARKER_CORNER_COUNT,
                    got: image_points.len(),
                })?;
        validate_quad(pts)?;
        Ok(Self {
            marker,
            image_points: *pts,
        })
    }

    #[inline]
    pub fn marker(&self) -> &MarkerSquare {
        &self.marker
    }

    #[inline]
    pub fn image_points(&self) -> &[Point2<f64>; MARKER_CORNER_COUNT] {
        &self.image_points
    }

    pub fn object_points(&self) -> [Point3<f64>; MARKER_CORNER_COUNT] {
        self.marker.corners()
    }
}

/// Reject quads no projected square can produce: non-finite coordinates,
/// repeated or collinear corners, and non-convex orderings.
fn validate_quad(pts: &[Point2<f64>; MARKER_CORNER_COUNT]) -> Result<(), PoseError> {
    if pts.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(PoseError::DegenerateGeometry {
            reason: "non-finite corner coordinates",
        });
    }

    let mut sign = 0.0_f64;
    for i in 0..MARKER_CORNER_COUNT {
        let a = pts[i];
        let b = pts[(i + 1) % MARKER_CORNER_COUNT];
        let c = pts[(i + 2) % MARKER_CORNER_COUNT];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < MIN_CORNER_CROSS {
            return Err(PoseError::DegenerateGeometry {
                reason: "collinear or coincident corners",
            });
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return Err(PoseError::DegenerateGeometry {
                reason: "corners do not form a convex quad",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_pixels() -> [Point2<f64>; 4] {
        [
            Point2::new(240.0, 320.0),
            Point2::new(400.0, 320.0),
            Point2::new(400.0, 160.0),
            Point2::new(240.0, 160.0),
        ]
    }

    #[test]
    fn object_corners_follow_the_canonical_order() {
        let m = MarkerSquare::new(2.0);
        let c = m.corners();
        assert_eq!(c[0], Point3::new(-1.0, 1.0, 0.0));
        assert_eq!(c[1], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(c[2], Point3::new(1.0, -1.0, 0.0));
        assert_eq!(c[3], Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(MarkerSquare::default().side_length(), 1.0);
    }

    #[test]
    fn four_valid_corners_are_accepted() {
        let corr =
            SquareCorrespondences::new(MarkerSquare::default(), &square_pixels()).expect("valid");
        assert_eq!(corr.image_points().len(), MARKER_CORNER_COUNT);
        assert_eq!(corr.object_points()[1], Point3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn wrong_corner_count_is_reported() {
        let pts = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        let err = SquareCorrespondences::new(MarkerSquare::default(), &pts).unwrap_err();
        assert_eq!(
            err,
            PoseError::InvalidCorrespondenceCount {
                expected: 4,
                got: 2
            }
        );
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let pts = [
            Point2::new(100.0, 100.0),
            Point2::new(200.0, 100.0),
            Point2::new(300.0, 100.0),
            Point2::new(400.0, 100.0),
        ];
        assert!(matches!(
            SquareCorrespondences::new(MarkerSquare::default(), &pts),
            Err(PoseError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn coincident_corners_are_degenerate() {
        let pts = [Point2::new(320.0, 240.0); 4];
        assert!(matches!(
            SquareCorrespondences::new(MarkerSquare::default(), &pts),
            Err(PoseError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn crossed_quad_is_rejected() {
        // Bow-tie ordering: two edges intersect.
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 100.0),
        ];
        assert!(matches!(
            SquareCorrespondences::new(MarkerSquare::default(), &pts),
            Err(PoseError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn non_finite_corner_is_rejected() {
        let mut pts = square_pixels();
        pts[2].x = f64::NAN;
        assert!(matches!(
            SquareCorrespondences::new(MarkerSquare::default(), &pts),
            Err(PoseError::DegenerateGeometry { .. })
        ));
    }
}
