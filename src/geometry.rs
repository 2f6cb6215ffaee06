//! Half-plane geometry in velocity space.
//!
//! All constraints the planner works with are directed lines: the feasible
//! region is the half-plane to the LEFT of the line. Vector arithmetic is
//! `glam::DVec2` throughout.

use glam::DVec2;

/// 2D cross product (determinant of the 2x2 matrix with columns `a`, `b`).
#[inline]
#[must_use]
pub fn det(a: DVec2, b: DVec2) -> f64 {
    a.x.mul_add(b.y, -(a.y * b.x))
}

/// A half-plane constraint in velocity space.
///
/// Valid velocities lie on the left side of the directed line (where
/// `direction.perp()` points). A candidate `v` is feasible iff
/// `det(direction, point - v) <= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// A point on the boundary line.
    pub point: DVec2,
    /// Direction along the line. Must be a unit vector.
    pub direction: DVec2,
}

impl Line {
    #[must_use]
    pub const fn new(point: DVec2, direction: DVec2) -> Self {
        Self { point, direction }
    }

    /// Signed distance of `velocity` into the forbidden half-plane.
    ///
    /// Zero on the boundary, negative inside the feasible region, positive
    /// values measure the depth of the violation.
    #[inline]
    #[must_use]
    pub fn violation(&self, velocity: DVec2) -> f64 {
        det(self.direction, self.point - velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn det_is_signed_parallelogram_area() {
        assert_eq!(det(DVec2::X, DVec2::Y), 1.0);
        assert_eq!(det(DVec2::Y, DVec2::X), -1.0);
        assert_eq!(det(DVec2::new(2.0, 0.0), DVec2::new(3.0, 0.0)), 0.0);
        assert_eq!(det(DVec2::new(1.0, 2.0), DVec2::new(3.0, 4.0)), -2.0);
    }

    #[test]
    fn feasible_side_is_left_of_direction() {
        // Boundary along +x through (0, 1): feasible side is y >= 1.
        let line = Line::new(DVec2::new(0.0, 1.0), DVec2::X);
        assert!(line.violation(DVec2::new(0.0, 2.0)) < 0.0);
        assert!(line.violation(DVec2::new(5.0, 0.0)) > 0.0);
        assert_eq!(line.violation(DVec2::new(-3.0, 1.0)), 0.0);
    }

    #[test]
    fn violation_on_boundary_is_zero() {
        let line = Line::new(DVec2::new(1.0, 0.0), DVec2::X);
        assert_eq!(line.violation(DVec2::ZERO), 0.0);
    }
}
