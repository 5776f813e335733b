//! Rigid placements in the layout plane.
//!
//! A source lays out its ray fan in a local frame (aperture along +y,
//! propagation along +x) and a [`Transform`] places that frame in the scene.

use nalgebra::Rotation2;

use crate::vector::Vec2;

/// Rotation about the origin followed by a translation (mm).
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub rotation: Rotation2<f64>,
    pub translation: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: Rotation2::identity(),
            translation: Vec2::zeros(),
        }
    }
}

impl Transform {
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            rotation: Rotation2::identity(),
            translation: Vec2::new(dx, dy),
        }
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotation(angle_rad: f64) -> Self {
        Self {
            rotation: Rotation2::new(angle_rad),
            translation: Vec2::zeros(),
        }
    }

    /// Frame with its origin at `(x, y)` and local +x axis at `angle_rad`.
    pub fn placement(x: f64, y: f64, angle_rad: f64) -> Self {
        Self::rotation(angle_rad).then(&Self::translation(x, y))
    }

    /// Map a local point into the parent frame.
    pub fn apply(&self, point: &Vec2) -> Vec2 {
        self.rotation * point + self.translation
    }

    /// Map a local direction; translation does not apply.
    pub fn apply_vector(&self, v: &Vec2) -> Vec2 {
        self.rotation * v
    }

    /// `self` first, then `other`.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            rotation: other.rotation * self.rotation,
            translation: other.rotation * self.translation + other.translation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_leaves_points() {
        let p = Transform::default().apply(&Vec2::new(1.0, 2.0));
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_placement_rotates_then_translates() {
        let frame = Transform::placement(10.0, -1.0, FRAC_PI_2);
        let p = frame.apply(&Vec2::new(1.0, 0.0));
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-12);
        // Local aperture axis (+y) points along -x after a quarter turn.
        let d = frame.apply_vector(&Vec2::new(0.0, 1.0));
        assert_abs_diff_eq!(d.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.y, 0.0, epsilon = 1e-12);
    }
}
