//! Per-element optical transforms.
//!
//! Each [`ElementKind`] maps an incident ray (direction, Jones vector,
//! medium, reflection parity) and the local surface frame from the geometry
//! kernel to one or two outgoing rays. The transforms are independent pure
//! functions selected by a `match` on the kind.
//!
//! # Conventions
//!
//! - Jones vectors are `(h, v)` = `(p, s)`; see [`crate::jones`].
//! - Outgoing Jones vectors are *not* renormalised: their intensity relative
//!   to the (unit) incident vector is the branch's power fraction.
//! - Ideal mirror: $\mathrm{diag}(r_p, r_s) = \mathrm{diag}(+1, -1)$.
//!   Every reflected branch carries this matrix, so the Jones frame stays in
//!   step with the `mirrored` parity.
//! - Non-polarizing splitter: transmitted amplitude $\sqrt{T/100}$,
//!   reflected amplitude $i\sqrt{R/100}$ on top of the mirror matrix. Power
//!   lost is $(100 - T - R)/100$.
//! - Polarizing splitter: transmitted branch is the projection onto the
//!   transmission axis, reflected branch the projection onto its
//!   orthogonal complement followed by the mirror matrix, with no extra phase.
//! - Every reflection toggles the ray's `mirrored` parity. A waveplate
//!   crossed with odd parity applies the conjugate retardance.

use log::debug;
use num_complex::Complex64;

use optrace_geometry::intersect::SegmentHit;
use optrace_geometry::vector::{deg2rad, normalize, reflect_vec, Vec2};

use crate::fresnel;
use crate::jones::{self, Polarization};
use crate::types::{Beamsplitter, Branch, ElementKind, RefractiveInterface, ThinLens, Waveplate};

/// The state of a ray arriving at an element.
#[derive(Debug, Clone, Copy)]
pub struct IncidentRay {
    /// Unit propagation direction.
    pub direction: Vec2,
    /// Unit-intensity Jones vector.
    pub polarization: Polarization,
    /// Refractive index of the medium the ray is travelling in.
    pub medium_n: f64,
    /// Odd number of reflections so far.
    pub mirrored: bool,
}

/// One ray leaving an element.
#[derive(Debug, Clone, Copy)]
pub struct Outgoing {
    pub direction: Vec2,
    /// Jones vector whose intensity is the power fraction of this branch.
    pub polarization: Polarization,
    pub medium_n: f64,
    pub mirrored: bool,
    pub branch: Branch,
}

impl Outgoing {
    /// Power carried relative to the incident ray.
    pub fn power(&self) -> f64 {
        self.polarization.intensity()
    }
}

/// Result of a single ray/element interaction.
#[derive(Debug, Clone, Copy)]
pub enum Interaction {
    /// A single outgoing ray.
    Continue(Outgoing),
    /// Two outgoing rays: `transmitted`, then `reflected`.
    Split { transmitted: Outgoing, reflected: Outgoing },
}

/// Apply the transform of `kind` at `hit` to `ray`.
pub fn interact(kind: &ElementKind, hit: &SegmentHit, ray: &IncidentRay) -> Interaction {
    match kind {
        ElementKind::Mirror => Interaction::Continue(mirror(hit, ray)),
        ElementKind::Lens(lens) => Interaction::Continue(thin_lens(lens, hit, ray)),
        ElementKind::Waveplate(plate) => Interaction::Continue(waveplate(plate, ray)),
        ElementKind::Beamsplitter(bs) if bs.is_polarizing => polarizing_split(bs, hit, ray),
        ElementKind::Beamsplitter(bs) => {
            let (transmitted, reflected) =
                power_split(bs.split_t, bs.split_r, hit, ray, ray.medium_n);
            Interaction::Split { transmitted, reflected }
        }
        ElementKind::RefractiveInterface(ri) => refract(ri, hit, ray),
    }
}

fn straight_through(ray: &IncidentRay, polarization: Polarization, branch: Branch) -> Outgoing {
    Outgoing {
        direction: ray.direction,
        polarization,
        medium_n: ray.medium_n,
        mirrored: ray.mirrored,
        branch,
    }
}

fn reflected_off(hit: &SegmentHit, ray: &IncidentRay, polarization: Polarization) -> Outgoing {
    Outgoing {
        direction: normalize(reflect_vec(ray.direction, hit.normal)),
        polarization,
        medium_n: ray.medium_n,
        mirrored: !ray.mirrored,
        branch: Branch::Reflected,
    }
}

/// Jones vector after an ideal, lossless mirror.
pub fn mirror_jones(polarization: &Polarization) -> Polarization {
    polarization.transformed(&jones::diagonal(Complex64::new(1.0, 0.0), Complex64::new(-1.0, 0.0)))
}

fn mirror(hit: &SegmentHit, ray: &IncidentRay) -> Outgoing {
    let mut out = reflected_off(hit, ray, mirror_jones(&ray.polarization));
    out.branch = Branch::Continued;
    out
}

/// Jones vector after a linear retarder.
///
/// Rotates into the fast/slow frame, delays the slow component by
/// `phase_shift_deg`, and rotates back. `reversed` conjugates the
/// retardance.
pub fn waveplate_jones(
    polarization: &Polarization,
    phase_shift_deg: f64,
    fast_axis_deg: f64,
    reversed: bool,
) -> Polarization {
    let axis = deg2rad(fast_axis_deg);
    let phase = if reversed { -deg2rad(phase_shift_deg) } else { deg2rad(phase_shift_deg) };
    let m = jones::rotation(-axis) * jones::retarder(phase) * jones::rotation(axis);
    polarization.transformed(&m)
}

fn waveplate(plate: &Waveplate, ray: &IncidentRay) -> Outgoing {
    let polarization = waveplate_jones(
        &ray.polarization,
        plate.phase_shift_deg,
        plate.fast_axis_deg,
        ray.mirrored,
    );
    straight_through(ray, polarization, Branch::Continued)
}

/// Outgoing direction of a paraxial thin lens.
///
/// With $y$ the offset of the hit from the lens centre along the tangent and
/// $\theta$ the ray angle to the lens axis, $\theta_{out} = \theta_{in} - y/f$.
/// A non-positive or non-finite focal length leaves the direction unchanged.
pub fn thin_lens_direction(direction: Vec2, hit: &SegmentHit, efl_mm: f64) -> Vec2 {
    if !(efl_mm > 0.0 && efl_mm.is_finite()) {
        return direction;
    }
    let along_axis = direction.dot(&hit.normal);
    let transverse = direction.dot(&hit.tangent);
    if along_axis.abs() < 1e-12 {
        return direction;
    }
    let axis = hit.normal * along_axis.signum();
    let y = (hit.point - hit.centre).dot(&hit.tangent);
    let theta_in = transverse.atan2(along_axis.abs());
    let theta_out = theta_in - y / efl_mm;
    normalize(axis * theta_out.cos() + hit.tangent * theta_out.sin())
}

fn thin_lens(lens: &ThinLens, hit: &SegmentHit, ray: &IncidentRay) -> Outgoing {
    let mut out = straight_through(ray, ray.polarization, Branch::Continued);
    out.direction = thin_lens_direction(ray.direction, hit, lens.efl_mm);
    out
}

/// Split by fixed power percentages with the `i` phase on reflection.
fn power_split(
    split_t: f64,
    split_r: f64,
    hit: &SegmentHit,
    ray: &IncidentRay,
    transmitted_medium: f64,
) -> (Outgoing, Outgoing) {
    let t_amp = Complex64::new((split_t / 100.0).max(0.0).sqrt(), 0.0);
    let r_amp = Complex64::new(0.0, (split_r / 100.0).max(0.0).sqrt());
    let mut transmitted = straight_through(ray, ray.polarization.scaled(t_amp), Branch::Transmitted);
    transmitted.medium_n = transmitted_medium;
    let reflected = reflected_off(hit, ray, mirror_jones(&ray.polarization).scaled(r_amp));
    (transmitted, reflected)
}

/// Transmitted and reflected Jones vectors of a polarizing splitter.
pub fn polarizing_split_jones(
    polarization: &Polarization,
    transmission_axis_deg: f64,
) -> (Polarization, Polarization) {
    let axis = deg2rad(transmission_axis_deg);
    let transmitted = polarization.transformed(&jones::linear_projector(axis));
    let reflected =
        polarization.transformed(&jones::linear_projector(axis + std::f64::consts::FRAC_PI_2));
    (transmitted, reflected)
}

fn polarizing_split(bs: &Beamsplitter, hit: &SegmentHit, ray: &IncidentRay) -> Interaction {
    let (t, r) = polarizing_split_jones(&ray.polarization, bs.transmission_axis_deg);
    Interaction::Split {
        transmitted: straight_through(ray, t, Branch::Transmitted),
        reflected: reflected_off(hit, ray, mirror_jones(&r)),
    }
}

/// Largest gap between a ray's medium and the interface index it is taken
/// to arrive from before the mismatch is logged.
const INDEX_MISMATCH: f64 = 1e-6;

/// Indices on the incoming and outgoing side for a ray in `medium_n`.
///
/// The ray leaves whichever of `n1`/`n2` is closer to its current medium,
/// so the interface acts the same from either side and for either endpoint
/// order. A ray whose medium matches neither index still snaps to the
/// nearer one; that usually means a layout error and is logged at debug.
pub fn interface_indices(ri: &RefractiveInterface, medium_n: f64) -> (f64, f64) {
    let (n_from, n_to) = if (medium_n - ri.n1).abs() <= (medium_n - ri.n2).abs() {
        (ri.n1, ri.n2)
    } else {
        (ri.n2, ri.n1)
    };
    if (medium_n - n_from).abs() > INDEX_MISMATCH {
        debug!(
            "Ray in medium n={} meets interface n1={} n2={}; treating it as arriving from n={}",
            medium_n, ri.n1, ri.n2, n_from
        );
    }
    (n_from, n_to)
}

fn refract(ri: &RefractiveInterface, hit: &SegmentHit, ray: &IncidentRay) -> Interaction {
    if !(ri.n1 > 0.0 && ri.n2 > 0.0 && ri.n1.is_finite() && ri.n2.is_finite()) {
        return Interaction::Continue(straight_through(ray, ray.polarization, Branch::Continued));
    }
    let (n_from, n_to) = interface_indices(ri, ray.medium_n);
    let direction = normalize(ray.direction);
    let mut normal = hit.normal;
    if direction.dot(&normal) > 0.0 {
        normal = -normal;
    }
    let cos_i = -direction.dot(&normal);
    let coefficients = fresnel::reflection(n_from, n_to, cos_i);
    let refracted = fresnel::refract_direction(direction, normal, n_from, n_to);

    let Some(refracted) = refracted else {
        // Total internal reflection: all power stays in the reflected ray.
        let polarization = ray
            .polarization
            .transformed(&jones::diagonal(coefficients.rp, coefficients.rs));
        let mut out = reflected_off(hit, ray, polarization);
        out.branch = Branch::Continued;
        return Interaction::Continue(out);
    };
    let refracted = normalize(refracted);

    if !ri.is_beam_splitter {
        let mut out = straight_through(ray, ray.polarization, Branch::Transmitted);
        out.direction = refracted;
        out.medium_n = n_to;
        return Interaction::Continue(out);
    }

    let (mut transmitted, reflected) = match (ri.split_t, ri.split_r) {
        (Some(t), Some(r)) => power_split(t, r, hit, ray, n_to),
        (t, r) => {
            let tp = (1.0 - coefficients.reflectance_p()).sqrt();
            let ts = (1.0 - coefficients.reflectance_s()).sqrt();
            let transmitted_jones = ray.polarization.transformed(&jones::diagonal(
                Complex64::new(tp, 0.0),
                Complex64::new(ts, 0.0),
            ));
            let reflected_jones = ray
                .polarization
                .transformed(&jones::diagonal(coefficients.rp, coefficients.rs));
            let mut transmitted =
                straight_through(ray, transmitted_jones, Branch::Transmitted);
            transmitted.medium_n = n_to;
            let mut reflected = reflected_off(hit, ray, reflected_jones);
            // A single supplied percentage rescales its own branch only.
            if let Some(t) = t {
                transmitted.polarization = rescale(&transmitted.polarization, &ray.polarization, t);
            }
            if let Some(r) = r {
                reflected.polarization =
                    rescale(&reflected.polarization, &mirror_jones(&ray.polarization), r);
            }
            (transmitted, reflected)
        }
    };
    transmitted.direction = refracted;
    Interaction::Split { transmitted, reflected }
}

/// Rescale a branch's Jones vector to carry `percent` of the power in
/// `lossless`, the branch's state with no Fresnel attenuation.
fn rescale(branch: &Polarization, lossless: &Polarization, percent: f64) -> Polarization {
    let target = (percent / 100.0).max(0.0) * lossless.intensity();
    let current = branch.intensity();
    if current <= 0.0 {
        return lossless.scaled(Complex64::new(target.sqrt(), 0.0));
    }
    branch.scaled(Complex64::new((target / current).sqrt(), 0.0))
}
