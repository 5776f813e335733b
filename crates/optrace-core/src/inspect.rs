//! Point inspection of traced paths.
//!
//! Given a point in the layout (typically under the cursor), find the
//! nearest path segment and report the light travelling along it.

use serde::{Deserialize, Serialize};

use optrace_geometry::vector::{from_array, to_array, Vec2};

use crate::jones::{Polarization, Stokes};
use crate::types::RayPath;

/// What is known about the light at one point of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// Segment index within the path's polyline.
    pub segment: usize,
    /// Closest point on that segment (mm).
    pub point: [f64; 2],
    /// Distance from the query point (mm).
    pub distance: f64,
    pub intensity: f64,
    pub polarization: Polarization,
    /// Stokes parameters of the polarization scaled by `intensity`.
    pub stokes: Stokes,
}

fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= 0.0 {
        return a;
    }
    let u = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * u
}

/// Probe `path` at the segment nearest to `point`, if within `tolerance` mm.
pub fn probe(path: &RayPath, point: [f64; 2], tolerance: f64) -> Option<Probe> {
    let query = from_array(point);
    let (segment, closest, distance) = path
        .points
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let c = closest_on_segment(query, from_array(w[0]), from_array(w[1]));
            (i, c, (c - query).norm())
        })
        .min_by(|a, b| a.2.total_cmp(&b.2))?;
    if distance > tolerance {
        return None;
    }
    let (intensity, polarization) = path.segment_state(segment)?;
    let s = polarization.stokes();
    Some(Probe {
        segment,
        point: to_array(&closest),
        distance,
        intensity,
        polarization,
        stokes: Stokes {
            s0: s.s0 * intensity,
            s1: s.s1 * intensity,
            s2: s.s2 * intensity,
            s3: s.s3 * intensity,
        },
    })
}

/// Probe every path and return the nearest hit with its path index.
pub fn probe_paths(paths: &[RayPath], point: [f64; 2], tolerance: f64) -> Option<(usize, Probe)> {
    paths
        .iter()
        .enumerate()
        .filter_map(|(i, path)| probe(path, point, tolerance).map(|p| (i, p)))
        .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
}
