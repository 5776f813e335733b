//! Elementary vector algebra in the layout plane.

use nalgebra::Vector2;

/// A 2D vector or point in millimetres.
pub type Vec2 = Vector2<f64>;

/// Vectors shorter than this are treated as zero by [`normalize`].
pub const NORM_EPSILON: f64 = 1e-12;

/// Convert an angle in degrees to radians.
pub fn deg2rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Unit vector along `v`.
///
/// Returns the zero vector when $\|v\| < \varepsilon$ instead of dividing
/// by (nearly) zero.
pub fn normalize(v: Vec2) -> Vec2 {
    let norm = v.norm();
    if norm < NORM_EPSILON || !norm.is_finite() {
        Vec2::zeros()
    } else {
        v / norm
    }
}

/// Mirror `v` about the line whose normal is `n_hat`.
///
/// $\mathbf{v}' = \mathbf{v} - 2(\mathbf{v}\cdot\hat{\mathbf{n}})\hat{\mathbf{n}}$
///
/// The normal is renormalised first so the result always has the same
/// length as `v`. A zero normal leaves `v` unchanged.
pub fn reflect_vec(v: Vec2, n_hat: Vec2) -> Vec2 {
    let n = normalize(n_hat);
    v - n * (2.0 * v.dot(&n))
}

/// Scalar cross product $a_x b_y - a_y b_x$.
pub fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// `v` rotated by +90°.
pub fn perp(v: &Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Unit vector at `angle_rad` from the +x axis.
pub fn unit_from_angle(angle_rad: f64) -> Vec2 {
    Vec2::new(angle_rad.cos(), angle_rad.sin())
}

pub fn from_array(p: [f64; 2]) -> Vec2 {
    Vec2::new(p[0], p[1])
}

pub fn to_array(v: &Vec2) -> [f64; 2] {
    [v.x, v.y]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_deg2rad() {
        assert_abs_diff_eq!(deg2rad(180.0), std::f64::consts::PI, epsilon = 1e-15);
        assert_abs_diff_eq!(deg2rad(-90.0), -std::f64::consts::FRAC_PI_2, epsilon = 1e-15);
    }

    #[test]
    fn test_normalize_nonzero_is_unit() {
        for v in [
            Vec2::new(3.0, 4.0),
            Vec2::new(-1e-6, 2e-6),
            Vec2::new(1e8, -3e8),
            Vec2::new(0.0, -7.5),
        ] {
            assert_abs_diff_eq!(normalize(v).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(normalize(Vec2::zeros()), Vec2::zeros());
        assert_eq!(normalize(Vec2::new(1e-15, 0.0)), Vec2::zeros());
    }

    #[test]
    fn test_reflect_preserves_magnitude() {
        let normals = [Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(-0.3, 2.0)];
        let vectors = [Vec2::new(1.0, -1.0), Vec2::new(5.0, 0.2), Vec2::new(-2.0, 7.0)];
        for n in normals {
            for v in vectors {
                assert_abs_diff_eq!(reflect_vec(v, n).norm(), v.norm(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_reflect_off_horizontal_line() {
        let r = reflect_vec(Vec2::new(1.0, -1.0), Vec2::new(0.0, 1.0));
        assert_abs_diff_eq!(r.x, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_reflect_with_zero_normal_is_identity() {
        let v = Vec2::new(2.0, -3.0);
        assert_eq!(reflect_vec(v, Vec2::zeros()), v);
    }
}
