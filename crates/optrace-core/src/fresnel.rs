//! Snell's law and Fresnel amplitude coefficients at a planar boundary.
//!
//! Conventions: the ray travels from index `n_from` into `n_to`; `cos_i` is
//! the cosine of the angle between the ray and the normal facing it. The
//! transmitted cosine is complex so that total internal reflection falls out
//! of the same formulas as unit-modulus reflection coefficients.

use num_complex::Complex64;

use optrace_geometry::vector::Vec2;

/// Fresnel reflection amplitudes for the s and p components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FresnelCoefficients {
    pub rs: Complex64,
    pub rp: Complex64,
}

impl FresnelCoefficients {
    /// Reflected power fraction of the s component.
    pub fn reflectance_s(&self) -> f64 {
        self.rs.norm_sqr().min(1.0)
    }

    /// Reflected power fraction of the p component.
    pub fn reflectance_p(&self) -> f64 {
        self.rp.norm_sqr().min(1.0)
    }
}

/// $\sin^2\theta_t = (n_1/n_2)^2 (1 - \cos^2\theta_i)$.
pub fn sin2_transmitted(n_from: f64, n_to: f64, cos_i: f64) -> f64 {
    let eta = n_from / n_to;
    eta * eta * (1.0 - cos_i * cos_i).max(0.0)
}

/// Whether the ray is totally internally reflected.
pub fn is_total_internal_reflection(n_from: f64, n_to: f64, cos_i: f64) -> bool {
    sin2_transmitted(n_from, n_to, cos_i) > 1.0
}

/// Reflection amplitudes from the Fresnel equations.
///
/// $r_s = \frac{n_1\cos\theta_i - n_2\cos\theta_t}{n_1\cos\theta_i + n_2\cos\theta_t}$,
/// $r_p = \frac{n_2\cos\theta_i - n_1\cos\theta_t}{n_2\cos\theta_i + n_1\cos\theta_t}$
pub fn reflection(n_from: f64, n_to: f64, cos_i: f64) -> FresnelCoefficients {
    let cos_t = Complex64::new(1.0 - sin2_transmitted(n_from, n_to, cos_i), 0.0).sqrt();
    let ci = Complex64::new(cos_i, 0.0);
    let rs = (n_from * ci - n_to * cos_t) / (n_from * ci + n_to * cos_t);
    let rp = (n_to * ci - n_from * cos_t) / (n_to * ci + n_from * cos_t);
    FresnelCoefficients { rs, rp }
}

/// Refracted direction by the vector form of Snell's law.
///
/// `direction` must be unit length and `normal` must be the unit normal
/// facing the incoming ray. Returns `None` under total internal reflection.
pub fn refract_direction(direction: Vec2, normal: Vec2, n_from: f64, n_to: f64) -> Option<Vec2> {
    let cos_i = -direction.dot(&normal);
    if is_total_internal_reflection(n_from, n_to, cos_i) {
        return None;
    }
    let eta = n_from / n_to;
    let cos_t = (1.0 - sin2_transmitted(n_from, n_to, cos_i)).sqrt();
    Some(direction * eta + normal * (eta * cos_i - cos_t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normal_incidence_glass() {
        let r = reflection(1.0, 1.5, 1.0);
        assert_abs_diff_eq!(r.reflectance_s(), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(r.reflectance_p(), 0.04, epsilon = 1e-12);
        assert!(r.rs.re < 0.0);
    }

    #[test]
    fn test_brewster_angle_kills_p() {
        let theta_b = 1.5_f64.atan();
        let r = reflection(1.0, 1.5, theta_b.cos());
        assert_abs_diff_eq!(r.reflectance_p(), 0.0, epsilon = 1e-12);
        assert!(r.reflectance_s() > 0.1);
    }

    #[test]
    fn test_tir_is_unit_modulus() {
        let cos_i = (60.0_f64).to_radians().cos();
        assert!(is_total_internal_reflection(1.5, 1.0, cos_i));
        let r = reflection(1.5, 1.0, cos_i);
        assert_abs_diff_eq!(r.rs.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.rp.norm(), 1.0, epsilon = 1e-12);
        let (s, c) = 60.0_f64.to_radians().sin_cos();
        let d = Vec2::new(s, -c);
        assert!(refract_direction(d, Vec2::new(0.0, 1.0), 1.5, 1.0).is_none());
        assert!(refract_direction(d, Vec2::new(0.0, 1.0), 1.0, 1.5).is_some());
    }

    #[test]
    fn test_snell_at_30_degrees() {
        let theta_i = 30.0_f64.to_radians();
        let d = Vec2::new(theta_i.sin(), -theta_i.cos());
        let n = Vec2::new(0.0, 1.0);
        let t = refract_direction(d, n, 1.0, 1.31).expect("no TIR entering glass");
        assert_abs_diff_eq!(t.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t.x.asin(), 0.391_612_6, epsilon = 1e-4);
    }
}
