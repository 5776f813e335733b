//! Core types shared across the optrace engine.
//!
//! This module defines the records the engine consumes (optical elements and
//! light sources) and the record it produces (ray paths). All of them are
//! plain data: they are built fresh for each trace and handed back to the
//! caller afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use optrace_geometry::intersect::{ray_hit_arc, ray_hit_element, SegmentHit, DEGENERATE_LENGTH};
use optrace_geometry::vector::{from_array, Vec2};

use crate::jones::{Polarization, PolarizationSpec};

/// Reasons an element has no (or a reduced) optical effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("Degenerate element: segment length {length:.3e} mm")]
    Degenerate { length: f64 },

    #[error("Element has non-finite coordinates")]
    NonFinite,

    #[error("Non-positive focal length {0} mm: lens will not deflect")]
    NonPositiveFocalLength(f64),

    #[error("Invalid refractive indices n1={n1}, n2={n2}")]
    InvalidIndex { n1: f64, n2: f64 },
}

/// An optical element: a line segment in the layout plane plus its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalElement {
    /// First endpoint (mm).
    pub p1: [f64; 2],
    /// Second endpoint (mm).
    pub p2: [f64; 2],
    /// What the element does to light.
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Kind-specific optical behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Mirror,
    Lens(ThinLens),
    Beamsplitter(Beamsplitter),
    Waveplate(Waveplate),
    RefractiveInterface(RefractiveInterface),
}

/// An ideal paraxial thin lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinLens {
    /// Effective focal length (mm). Non-positive values disable deflection.
    pub efl_mm: f64,
}

/// A partially reflecting or polarizing beamsplitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beamsplitter {
    /// Transmitted power (percent). `split_t + split_r` may be below 100;
    /// the remainder is absorbed.
    #[serde(rename = "split_T", default = "default_split")]
    pub split_t: f64,
    /// Reflected power (percent).
    #[serde(rename = "split_R", default = "default_split")]
    pub split_r: f64,
    /// Split by polarization instead of by `split_t`/`split_r`.
    #[serde(default)]
    pub is_polarizing: bool,
    /// Axis transmitted by a polarizing splitter (degrees from `h`).
    #[serde(default)]
    pub transmission_axis_deg: f64,
}

/// A linear retarder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveplate {
    /// Retardance of the slow axis relative to the fast axis (degrees).
    pub phase_shift_deg: f64,
    /// Fast-axis orientation (degrees from `h`).
    #[serde(default)]
    pub fast_axis_deg: f64,
}

/// A boundary between two media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefractiveInterface {
    pub n1: f64,
    pub n2: f64,
    /// Signed radius of curvature (mm). Positive puts the centre of curvature
    /// on the +x side of the chord (+y for a horizontal chord). `None` is flat.
    #[serde(default)]
    pub radius_mm: Option<f64>,
    /// Also emit a reflected branch.
    #[serde(default = "default_true")]
    pub is_beam_splitter: bool,
    /// Caller-supplied transmitted power (percent); Fresnel when absent.
    #[serde(rename = "split_T", default)]
    pub split_t: Option<f64>,
    /// Caller-supplied reflected power (percent); Fresnel when absent.
    #[serde(rename = "split_R", default)]
    pub split_r: Option<f64>,
}

fn default_split() -> f64 {
    50.0
}
fn default_true() -> bool {
    true
}

impl ElementKind {
    /// Short lowercase name, matching the serialised tag.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Mirror => "mirror",
            ElementKind::Lens(_) => "lens",
            ElementKind::Beamsplitter(_) => "beamsplitter",
            ElementKind::Waveplate(_) => "waveplate",
            ElementKind::RefractiveInterface(_) => "refractive_interface",
        }
    }
}

impl OpticalElement {
    pub fn new(p1: [f64; 2], p2: [f64; 2], kind: ElementKind) -> Self {
        Self { p1, p2, kind }
    }

    pub fn mirror(p1: [f64; 2], p2: [f64; 2]) -> Self {
        Self::new(p1, p2, ElementKind::Mirror)
    }

    pub fn lens(p1: [f64; 2], p2: [f64; 2], efl_mm: f64) -> Self {
        Self::new(p1, p2, ElementKind::Lens(ThinLens { efl_mm }))
    }

    /// Non-polarizing beamsplitter with transmit/reflect percentages.
    pub fn beamsplitter(p1: [f64; 2], p2: [f64; 2], split_t: f64, split_r: f64) -> Self {
        Self::new(
            p1,
            p2,
            ElementKind::Beamsplitter(Beamsplitter {
                split_t,
                split_r,
                is_polarizing: false,
                transmission_axis_deg: 0.0,
            }),
        )
    }

    pub fn polarizing_beamsplitter(p1: [f64; 2], p2: [f64; 2], transmission_axis_deg: f64) -> Self {
        Self::new(
            p1,
            p2,
            ElementKind::Beamsplitter(Beamsplitter {
                split_t: 100.0,
                split_r: 100.0,
                is_polarizing: true,
                transmission_axis_deg,
            }),
        )
    }

    pub fn waveplate(p1: [f64; 2], p2: [f64; 2], phase_shift_deg: f64, fast_axis_deg: f64) -> Self {
        Self::new(
            p1,
            p2,
            ElementKind::Waveplate(Waveplate { phase_shift_deg, fast_axis_deg }),
        )
    }

    /// Flat interface with a Fresnel reflected branch.
    pub fn refractive_interface(p1: [f64; 2], p2: [f64; 2], n1: f64, n2: f64) -> Self {
        Self::new(
            p1,
            p2,
            ElementKind::RefractiveInterface(RefractiveInterface {
                n1,
                n2,
                radius_mm: None,
                is_beam_splitter: true,
                split_t: None,
                split_r: None,
            }),
        )
    }

    pub fn length(&self) -> f64 {
        (from_array(self.p2) - from_array(self.p1)).norm()
    }

    /// Check the element for conditions that limit its optical effect.
    ///
    /// `Degenerate` and `NonFinite` elements are skipped by the tracer;
    /// the remaining errors describe elements that are traced but act as
    /// pass-through.
    pub fn validate(&self) -> Result<(), ElementError> {
        if !self.p1.iter().chain(self.p2.iter()).all(|c| c.is_finite()) {
            return Err(ElementError::NonFinite);
        }
        let length = self.length();
        if length < DEGENERATE_LENGTH {
            return Err(ElementError::Degenerate { length });
        }
        match &self.kind {
            ElementKind::Lens(lens) if !(lens.efl_mm > 0.0 && lens.efl_mm.is_finite()) => {
                Err(ElementError::NonPositiveFocalLength(lens.efl_mm))
            }
            ElementKind::RefractiveInterface(ri)
                if !(ri.n1 > 0.0 && ri.n2 > 0.0 && ri.n1.is_finite() && ri.n2.is_finite()) =>
            {
                Err(ElementError::InvalidIndex { n1: ri.n1, n2: ri.n2 })
            }
            _ => Ok(()),
        }
    }

    /// Whether the tracer should consider this element at all.
    pub fn is_traceable(&self) -> bool {
        !matches!(
            self.validate(),
            Err(ElementError::Degenerate { .. }) | Err(ElementError::NonFinite)
        )
    }

    /// Nearest hit of the ray with this element beyond `min_t`.
    pub fn hit(&self, origin: Vec2, direction: Vec2, min_t: f64) -> Option<SegmentHit> {
        let a = from_array(self.p1);
        let b = from_array(self.p2);
        match &self.kind {
            ElementKind::RefractiveInterface(RefractiveInterface {
                radius_mm: Some(radius),
                ..
            }) => ray_hit_arc(origin, direction, a, b, *radius, min_t),
            _ => ray_hit_element(origin, direction, a, b).filter(|hit| hit.t > min_t),
        }
    }
}

/// A light source emitting a fan of rays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceParams {
    /// Origin (mm).
    pub x_mm: f64,
    pub y_mm: f64,
    /// Central emission direction (degrees from +x).
    pub angle_deg: f64,
    /// Full angular width of the fan (degrees).
    #[serde(default)]
    pub spread_deg: f64,
    /// Full lateral aperture (mm), perpendicular to the emission direction.
    #[serde(default)]
    pub size_mm: f64,
    #[serde(default = "default_n_rays")]
    pub n_rays: usize,
    /// Length of the final segment of a ray that leaves the scene (mm).
    #[serde(default = "default_ray_length")]
    pub ray_length_mm: f64,
    #[serde(default = "default_wavelength")]
    pub wavelength_nm: f64,
    #[serde(default)]
    pub polarization: PolarizationSpec,
    /// Refractive index of the medium the source sits in.
    #[serde(default = "default_medium_n")]
    pub medium_n: f64,
}

fn default_n_rays() -> usize {
    1
}
fn default_ray_length() -> f64 {
    100.0
}
fn default_wavelength() -> f64 {
    632.8
}
fn default_medium_n() -> f64 {
    1.0
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            x_mm: 0.0,
            y_mm: 0.0,
            angle_deg: 0.0,
            spread_deg: 0.0,
            size_mm: 0.0,
            n_rays: default_n_rays(),
            ray_length_mm: default_ray_length(),
            wavelength_nm: default_wavelength(),
            polarization: PolarizationSpec::default(),
            medium_n: default_medium_n(),
        }
    }
}

impl SourceParams {
    /// A single collimated ray from `(x_mm, y_mm)` at `angle_deg`.
    pub fn new(x_mm: f64, y_mm: f64, angle_deg: f64) -> Self {
        Self { x_mm, y_mm, angle_deg, ..Default::default() }
    }
}

/// Which outgoing branch an interaction produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    /// The single continuation of a non-splitting element.
    Continued,
    Transmitted,
    Reflected,
}

/// Why a ray stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No further element in the way; a final segment was drawn.
    Escaped,
    /// The interaction budget ran out; a final segment was drawn.
    BudgetExhausted,
    /// Every outgoing branch fell below the intensity cutoff.
    Absorbed,
}

/// One interaction along a path, with the state just after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEvent {
    pub point: [f64; 2],
    /// Index of the element in the caller's element list.
    pub element_index: usize,
    pub branch: Branch,
    pub intensity: f64,
    pub polarization: Polarization,
}

/// A complete ray path from its source to its termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayPath {
    /// Polyline vertices (mm), starting at the emission point.
    pub points: Vec<[f64; 2]>,
    /// Branch weight of the final segment (1.0 for an unsplit source ray).
    pub intensity: f64,
    /// Unit-intensity polarization valid on the final segment.
    pub polarization: Polarization,
    /// Polarization on the first segment, as emitted.
    pub initial_polarization: Polarization,
    pub source_index: usize,
    pub wavelength_nm: f64,
    /// Interactions in order; event `i` happened at `points[i + 1]`.
    pub events: Vec<PathEvent>,
    pub termination: Termination,
}

impl RayPath {
    /// Number of straight segments in the polyline.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Intensity and polarization valid on segment `index`.
    pub fn segment_state(&self, index: usize) -> Option<(f64, Polarization)> {
        if index >= self.segment_count() {
            return None;
        }
        match index.checked_sub(1).and_then(|i| self.events.get(i)) {
            Some(event) => Some((event.intensity, event.polarization)),
            None if index == 0 => Some((1.0, self.initial_polarization)),
            None => Some((self.intensity, self.polarization)),
        }
    }

    /// Final propagation direction, if the path has at least one segment.
    pub fn final_direction(&self) -> Option<Vec2> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        let last = from_array(self.points[n - 1]) - from_array(self.points[n - 2]);
        Some(optrace_geometry::normalize(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_element_is_reported() {
        let e = OpticalElement::mirror([1.0, 1.0], [1.0, 1.0]);
        assert!(matches!(e.validate(), Err(ElementError::Degenerate { .. })));
        assert!(!e.is_traceable());
    }

    #[test]
    fn test_non_finite_element_is_reported() {
        let e = OpticalElement::mirror([f64::NAN, 0.0], [1.0, 1.0]);
        assert_eq!(e.validate(), Err(ElementError::NonFinite));
        assert!(!e.is_traceable());
    }

    #[test]
    fn test_non_positive_lens_is_traceable() {
        let e = OpticalElement::lens([-1.0, 0.0], [1.0, 0.0], -50.0);
        assert_eq!(e.validate(), Err(ElementError::NonPositiveFocalLength(-50.0)));
        assert!(e.is_traceable());
    }

    #[test]
    fn test_element_deserialises_from_tagged_json() {
        let json = r#"{
            "p1": [0.0, -5.0], "p2": [0.0, 5.0],
            "kind": "beamsplitter", "split_T": 70.0, "split_R": 30.0
        }"#;
        let e: OpticalElement = serde_json::from_str(json).unwrap();
        match e.kind {
            ElementKind::Beamsplitter(bs) => {
                assert_eq!(bs.split_t, 70.0);
                assert_eq!(bs.split_r, 30.0);
                assert!(!bs.is_polarizing);
            }
            other => panic!("expected beamsplitter, got {:?}", other),
        }
    }

    #[test]
    fn test_mirror_deserialises_without_fields() {
        let e: OpticalElement =
            serde_json::from_str(r#"{"p1": [0.0, 0.0], "p2": [1.0, 0.0], "kind": "mirror"}"#).unwrap();
        assert_eq!(e.kind, ElementKind::Mirror);
    }

    #[test]
    fn test_source_defaults() {
        let s: SourceParams =
            serde_json::from_str(r#"{"x_mm": 1.0, "y_mm": 2.0, "angle_deg": 45.0}"#).unwrap();
        assert_eq!(s.n_rays, 1);
        assert_eq!(s.medium_n, 1.0);
        assert_eq!(s.polarization, PolarizationSpec::Horizontal);
    }
}
