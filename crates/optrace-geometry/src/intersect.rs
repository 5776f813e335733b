//! Ray intersection with flat segments and circular arcs.
//!
//! A ray is $\mathbf{P} + t\mathbf{V}$ with $t \ge 0$. A segment is
//! $\mathbf{A} + u(\mathbf{B} - \mathbf{A})$ with $u \in [0, 1]$. Every hit
//! reports the local frame of the surface at the hit point: the unit
//! tangent $\hat{t}$ (along $\mathbf{A} \to \mathbf{B}$) and the unit normal
//! $\hat{n} = (-\hat{t}_y, \hat{t}_x)$.

use crate::vector::{cross, normalize, perp, Vec2};

/// Determinants below this magnitude mean the ray runs parallel to the segment.
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// Segments shorter than this (mm) have no optical effect.
pub const DEGENERATE_LENGTH: f64 = 1e-9;

/// Slack on the segment parameter so that exact endpoint hits count.
const SEGMENT_SLACK: f64 = 1e-12;

/// Where and how a ray meets a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Distance parameter along the ray (in units of `|V|`).
    pub t: f64,
    /// Intersection point (mm).
    pub point: Vec2,
    /// Unit tangent of the surface at the hit, oriented along A→B.
    pub tangent: Vec2,
    /// Unit normal, the tangent rotated by +90°.
    pub normal: Vec2,
    /// Midpoint of the chord A–B (mm).
    pub centre: Vec2,
    /// Length of the chord A–B (mm).
    pub length: f64,
}

fn is_finite(v: &Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Intersect the ray `origin + t * direction` with the segment `a`–`b`.
///
/// Returns `None` when the ray is parallel to the segment, when the hit lies
/// behind the origin, when it falls outside the segment, or when the
/// segment itself is degenerate (zero length or non-finite endpoints).
pub fn ray_hit_element(origin: Vec2, direction: Vec2, a: Vec2, b: Vec2) -> Option<SegmentHit> {
    if !is_finite(&a) || !is_finite(&b) || !is_finite(&origin) || !is_finite(&direction) {
        return None;
    }
    let d = b - a;
    let length = d.norm();
    if length < DEGENERATE_LENGTH {
        return None;
    }

    // Solve P + tV = A + u d by Cramer's rule on the 2x2 system.
    let det = cross(&direction, &d);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let w = a - origin;
    let t = cross(&w, &d) / det;
    let u = cross(&w, &direction) / det;

    if t < 0.0 || u < -SEGMENT_SLACK || u > 1.0 + SEGMENT_SLACK {
        return None;
    }

    let tangent = d / length;
    Some(SegmentHit {
        t,
        point: origin + direction * t,
        tangent,
        normal: perp(&tangent),
        centre: (a + b) * 0.5,
        length,
    })
}

/// The chord normal that points into the +x half-plane (+y for a vertical
/// normal). It depends only on the segment as a set, not on which endpoint
/// is labelled first.
pub fn canonical_normal(a: Vec2, b: Vec2) -> Vec2 {
    let n = perp(&normalize(b - a));
    if n.x < -PARALLEL_EPSILON || (n.x.abs() <= PARALLEL_EPSILON && n.y < 0.0) {
        -n
    } else {
        n
    }
}

/// Intersect a ray with the circular arc spanning the chord `a`–`b`.
///
/// The centre of curvature sits on the chord's perpendicular bisector, on
/// the side of [`canonical_normal`] when `radius > 0` and on the opposite
/// side when `radius < 0`; the arc is the minor arc between the endpoints.
/// Roots with `t <= min_t` are ignored so a ray leaving the surface does not
/// re-hit it at its own origin.
///
/// Falls back to [`ray_hit_element`] on the chord when the radius is not
/// finite or too small to span the chord.
pub fn ray_hit_arc(
    origin: Vec2,
    direction: Vec2,
    a: Vec2,
    b: Vec2,
    radius: f64,
    min_t: f64,
) -> Option<SegmentHit> {
    let chord = b - a;
    let length = chord.norm();
    let half = 0.5 * length;
    if !radius.is_finite() || radius.abs() <= half {
        return ray_hit_element(origin, direction, a, b).filter(|hit| hit.t > min_t);
    }
    if !is_finite(&a) || !is_finite(&b) || length < DEGENERATE_LENGTH {
        return None;
    }

    let chord_centre = (a + b) * 0.5;
    let axis = canonical_normal(a, b);
    let sag_offset = (radius * radius - half * half).sqrt();
    let centre = chord_centre + axis * (radius.signum() * sag_offset);
    // Unit vector from the centre of curvature towards the arc's apex.
    let towards_arc = -axis * radius.signum();

    let dd = direction.norm_squared();
    if dd < PARALLEL_EPSILON {
        return None;
    }
    let oc = origin - centre;
    let half_b = oc.dot(&direction);
    let c = oc.norm_squared() - radius * radius;
    let disc = half_b * half_b - dd * c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();

    for t in [(-half_b - root) / dd, (-half_b + root) / dd] {
        if t <= min_t {
            continue;
        }
        let point = origin + direction * t;
        let radial = point - centre;
        // Points of the minor arc project beyond the chord along `towards_arc`.
        if radial.dot(&towards_arc) < sag_offset - 1e-9 * radius.abs() {
            continue;
        }
        let mut tangent = perp(&normalize(radial));
        if tangent.dot(&chord) < 0.0 {
            tangent = -tangent;
        }
        return Some(SegmentHit {
            t,
            point,
            tangent,
            normal: perp(&tangent),
            centre: chord_centre,
            length,
        });
    }
    None
}
