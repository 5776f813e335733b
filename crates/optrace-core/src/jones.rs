//! Jones-vector polarization states and their Stokes parameters.
//!
//! In a 2D layout the plane of incidence at every surface is the layout plane
//! itself, so a single transverse basis serves globally:
//!
//! - `h` — the in-plane transverse field, i.e. the **p** component;
//! - `v` — the out-of-plane field, i.e. the **s** component.
//!
//! Angles of linear states and optical axes are measured from `h` towards
//! `v`. Matrices act on the column vector $(h, v)^T$.

use nalgebra::{Matrix2, Vector2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A 2x2 complex Jones matrix.
pub type JonesMatrix = Matrix2<Complex64>;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A fully polarized field as a Jones vector $(E_h, E_v)$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polarization {
    /// In-plane (p) component.
    pub h: Complex64,
    /// Out-of-plane (s) component.
    pub v: Complex64,
}

impl Polarization {
    pub fn new(h: Complex64, v: Complex64) -> Self {
        Self { h, v }
    }

    pub fn horizontal() -> Self {
        Self::new(ONE, ZERO)
    }

    pub fn vertical() -> Self {
        Self::new(ZERO, ONE)
    }

    /// Linear at +45°.
    pub fn diagonal() -> Self {
        Self::linear(std::f64::consts::FRAC_PI_4)
    }

    /// Linear at -45°.
    pub fn anti_diagonal() -> Self {
        Self::linear(-std::f64::consts::FRAC_PI_4)
    }

    /// $(1, i)/\sqrt{2}$, which has $S_3 = +1$.
    pub fn left_circular() -> Self {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        Self::new(Complex64::new(a, 0.0), Complex64::new(0.0, a))
    }

    /// $(1, -i)/\sqrt{2}$, which has $S_3 = -1$.
    pub fn right_circular() -> Self {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        Self::new(Complex64::new(a, 0.0), Complex64::new(0.0, -a))
    }

    /// Linear polarization at `angle_rad` from `h`.
    pub fn linear(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self::new(Complex64::new(c, 0.0), Complex64::new(s, 0.0))
    }

    /// Power carried by the field: $|E_h|^2 + |E_v|^2$.
    pub fn intensity(&self) -> f64 {
        self.h.norm_sqr() + self.v.norm_sqr()
    }

    /// The same state scaled to unit intensity. A zero field is returned as is.
    pub fn normalized(&self) -> Self {
        let norm = self.intensity().sqrt();
        if norm < 1e-300 {
            *self
        } else {
            Self::new(self.h / norm, self.v / norm)
        }
    }

    /// Multiply both components by a complex amplitude.
    pub fn scaled(&self, factor: Complex64) -> Self {
        Self::new(self.h * factor, self.v * factor)
    }

    /// Apply a Jones matrix.
    pub fn transformed(&self, m: &JonesMatrix) -> Self {
        Self::from_vector(m * self.as_vector())
    }

    pub fn as_vector(&self) -> Vector2<Complex64> {
        Vector2::new(self.h, self.v)
    }

    pub fn from_vector(v: Vector2<Complex64>) -> Self {
        Self::new(v.x, v.y)
    }

    /// Stokes parameters of this field.
    ///
    /// $S_0 = |h|^2 + |v|^2$, $S_1 = |h|^2 - |v|^2$,
    /// $S_2 = 2\,\mathrm{Re}(h^* v)$, $S_3 = 2\,\mathrm{Im}(h^* v)$.
    pub fn stokes(&self) -> Stokes {
        let cross = self.h.conj() * self.v;
        Stokes {
            s0: self.intensity(),
            s1: self.h.norm_sqr() - self.v.norm_sqr(),
            s2: 2.0 * cross.re,
            s3: 2.0 * cross.im,
        }
    }
}

impl Default for Polarization {
    fn default() -> Self {
        Self::horizontal()
    }
}

/// Stokes parameters $(S_0, S_1, S_2, S_3)$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stokes {
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl Stokes {
    /// $\sqrt{S_1^2 + S_2^2 + S_3^2} / S_0$; zero for a dark field.
    pub fn degree_of_polarization(&self) -> f64 {
        if self.s0 <= 0.0 {
            return 0.0;
        }
        (self.s1 * self.s1 + self.s2 * self.s2 + self.s3 * self.s3).sqrt() / self.s0
    }

    /// Orientation of the polarization ellipse's major axis (radians, from `h`).
    pub fn azimuth(&self) -> f64 {
        0.5 * self.s2.atan2(self.s1)
    }

    /// Ellipticity angle $\chi$ with $\tan\chi$ the minor/major axis ratio;
    /// 0 for linear, $\pm\pi/4$ for circular.
    pub fn ellipticity(&self) -> f64 {
        if self.s0 <= 0.0 {
            return 0.0;
        }
        0.5 * (self.s3 / self.s0).clamp(-1.0, 1.0).asin()
    }
}

/// Matrix taking global `(h, v)` components into a frame rotated by `angle_rad`.
pub fn rotation(angle_rad: f64) -> JonesMatrix {
    let (s, c) = angle_rad.sin_cos();
    JonesMatrix::new(
        Complex64::new(c, 0.0),
        Complex64::new(s, 0.0),
        Complex64::new(-s, 0.0),
        Complex64::new(c, 0.0),
    )
}

/// Linear retarder with its fast axis along `h`: the slow component picks
/// up $e^{i\varphi}$.
pub fn retarder(phase_rad: f64) -> JonesMatrix {
    JonesMatrix::new(ONE, ZERO, ZERO, Complex64::from_polar(1.0, phase_rad))
}

/// Orthogonal projector onto linear polarization at `angle_rad`.
pub fn linear_projector(angle_rad: f64) -> JonesMatrix {
    let (s, c) = angle_rad.sin_cos();
    JonesMatrix::new(
        Complex64::new(c * c, 0.0),
        Complex64::new(c * s, 0.0),
        Complex64::new(c * s, 0.0),
        Complex64::new(s * s, 0.0),
    )
}

/// Diagonal matrix acting separately on the p (`h`) and s (`v`) components.
pub fn diagonal(p: Complex64, s: Complex64) -> JonesMatrix {
    JonesMatrix::new(p, ZERO, ZERO, s)
}

/// Polarization descriptor attached to a light source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PolarizationSpec {
    #[default]
    Horizontal,
    Vertical,
    Diagonal,
    AntiDiagonal,
    LeftCircular,
    RightCircular,
    /// Linear at an arbitrary angle from `h`.
    Linear { angle_deg: f64 },
    /// Explicit Jones vector, each component as `[re, im]`.
    Jones { h: [f64; 2], v: [f64; 2] },
}

impl PolarizationSpec {
    /// The unit-intensity Jones vector this descriptor names.
    pub fn to_polarization(&self) -> Polarization {
        match self {
            PolarizationSpec::Horizontal => Polarization::horizontal(),
            PolarizationSpec::Vertical => Polarization::vertical(),
            PolarizationSpec::Diagonal => Polarization::diagonal(),
            PolarizationSpec::AntiDiagonal => Polarization::anti_diagonal(),
            PolarizationSpec::LeftCircular => Polarization::left_circular(),
            PolarizationSpec::RightCircular => Polarization::right_circular(),
            PolarizationSpec::Linear { angle_deg } => {
                Polarization::linear(optrace_geometry::deg2rad(*angle_deg))
            }
            PolarizationSpec::Jones { h, v } => Polarization::new(
                Complex64::new(h[0], h[1]),
                Complex64::new(v[0], v[1]),
            )
            .normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_canonical_states_have_unit_intensity() {
        for p in [
            Polarization::horizontal(),
            Polarization::vertical(),
            Polarization::diagonal(),
            Polarization::anti_diagonal(),
            Polarization::left_circular(),
            Polarization::right_circular(),
            Polarization::linear(0.3),
        ] {
            assert_abs_diff_eq!(p.intensity(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_stokes_of_canonical_states() {
        let h = Polarization::horizontal().stokes();
        assert_abs_diff_eq!(h.s1, 1.0, epsilon = 1e-12);
        let v = Polarization::vertical().stokes();
        assert_abs_diff_eq!(v.s1, -1.0, epsilon = 1e-12);
        let d = Polarization::diagonal().stokes();
        assert_abs_diff_eq!(d.s2, 1.0, epsilon = 1e-12);
        let l = Polarization::left_circular().stokes();
        assert_abs_diff_eq!(l.s3, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(l.ellipticity(), std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
        let r = Polarization::right_circular().stokes();
        assert_abs_diff_eq!(r.s3, -1.0, epsilon = 1e-12);
        for s in [h, v, d, l, r] {
            assert_abs_diff_eq!(s.degree_of_polarization(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_azimuth_of_linear_state() {
        let s = Polarization::linear(0.4).stokes();
        assert_abs_diff_eq!(s.azimuth(), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(s.ellipticity(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_round_trip_is_identity() {
        let p = Polarization::new(Complex64::new(0.3, 0.1), Complex64::new(-0.2, 0.9));
        let q = p.transformed(&rotation(0.7)).transformed(&rotation(-0.7));
        assert_abs_diff_eq!((q.h - p.h).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((q.v - p.v).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projector_follows_malus_law() {
        let p = Polarization::horizontal();
        let theta: f64 = 0.5;
        let out = p.transformed(&linear_projector(theta));
        assert_abs_diff_eq!(out.intensity(), theta.cos().powi(2), epsilon = 1e-12);
    }

    #[test]
    fn test_jones_state_is_normalised() {
        let spec = PolarizationSpec::Jones { h: [3.0, 0.0], v: [0.0, 4.0] };
        assert_abs_diff_eq!(spec.to_polarization().intensity(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polarization_state_from_tag() {
        let spec: PolarizationSpec =
            serde_json::from_str(r#"{"state": "linear", "angle_deg": 30.0}"#).unwrap();
        assert_eq!(spec, PolarizationSpec::Linear { angle_deg: 30.0 });
    }
}
