//! Ray tracer / path composer.
//!
//! Rays are processed from an explicit work list. Each task owns its
//! accumulated polyline, so a split simply clones the prefix into two
//! independent children. A task repeatedly:
//!
//! 1. finds the nearest element hit with `t > epsilon`;
//! 2. if there is none, or the interaction budget is spent, appends a final
//!    segment of `ray_length_mm` and terminates;
//! 3. otherwise appends the hit point, applies the element transform, and
//!    either continues or pushes its children back onto the work list.
//!
//! The trace is a pure function of its inputs: no I/O, no shared state, and
//! the same inputs always give the same paths in the same order.

use log::{debug, trace, warn};

use optrace_geometry::intersect::SegmentHit;
use optrace_geometry::transform::Transform;
use optrace_geometry::vector::{deg2rad, normalize, to_array, unit_from_angle, Vec2};

use crate::interaction::{interact, IncidentRay, Interaction, Outgoing};
use crate::jones::Polarization;
use crate::types::{OpticalElement, PathEvent, RayPath, SourceParams, Termination};

/// Parameters controlling a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceOptions {
    /// Interactions allowed per ray, counted along the whole branch history.
    pub max_events: usize,
    /// Hits closer than this (mm) to a ray's origin are ignored.
    pub epsilon: f64,
    /// Branches at or below this intensity are dropped.
    pub min_intensity: f64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            max_events: 32,
            epsilon: 1e-9,
            min_intensity: 1e-9,
        }
    }
}

impl TraceOptions {
    pub fn with_max_events(max_events: usize) -> Self {
        Self { max_events, ..Default::default() }
    }
}

/// Trace every source through the elements with default options.
pub fn trace(
    elements: &[OpticalElement],
    sources: &[SourceParams],
    max_events: usize,
) -> Vec<RayPath> {
    RayTracer::new(TraceOptions::with_max_events(max_events)).trace(elements, sources)
}

/// A ray in flight.
#[derive(Debug, Clone)]
struct RayTask {
    origin: Vec2,
    direction: Vec2,
    polarization: Polarization,
    intensity: f64,
    medium_n: f64,
    mirrored: bool,
    remaining: usize,
    path: RayPath,
    ray_length_mm: f64,
}

impl RayTask {
    /// A child continuing from the current hit with the given branch.
    fn fork(&self, out: &Outgoing, intensity: f64) -> RayTask {
        let mut child = self.clone();
        child.apply(out, intensity);
        child
    }

    fn apply(&mut self, out: &Outgoing, intensity: f64) {
        self.direction = normalize(out.direction);
        self.polarization = out.polarization.normalized();
        self.intensity = intensity;
        self.medium_n = out.medium_n;
        self.mirrored = out.mirrored;
    }

    fn record(&mut self, element_index: usize, out: &Outgoing) {
        self.path.events.push(PathEvent {
            point: to_array(&self.origin),
            element_index,
            branch: out.branch,
            intensity: self.intensity,
            polarization: self.polarization,
        });
    }

    /// Close the path with a final straight segment.
    fn finish(mut self, termination: Termination) -> RayPath {
        let end = self.origin + self.direction * self.ray_length_mm;
        self.path.points.push(to_array(&end));
        self.close(termination)
    }

    fn close(mut self, termination: Termination) -> RayPath {
        self.path.intensity = self.intensity;
        self.path.polarization = self.polarization;
        self.path.termination = termination;
        self.path
    }
}

/// Traces sources through a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct RayTracer {
    pub options: TraceOptions,
}

impl RayTracer {
    pub fn new(options: TraceOptions) -> Self {
        Self { options }
    }

    /// Trace all sources and return every terminated path, branches included.
    ///
    /// Paths are ordered by source, then depth-first with the transmitted
    /// branch of each split before the reflected one.
    pub fn trace(&self, elements: &[OpticalElement], sources: &[SourceParams]) -> Vec<RayPath> {
        let active: Vec<(usize, &OpticalElement)> = elements
            .iter()
            .enumerate()
            .filter(|(index, element)| {
                if element.is_traceable() {
                    true
                } else {
                    warn!("Skipping element {} ({}): degenerate geometry", index, element.kind.name());
                    false
                }
            })
            .collect();

        let mut paths = Vec::new();
        for (source_index, source) in sources.iter().enumerate() {
            let before = paths.len();
            let mut work: Vec<RayTask> = emit_rays(source, source_index, self.options.max_events);
            // Pop from the back, so reverse to trace rays in emission order.
            work.reverse();
            while let Some(task) = work.pop() {
                self.propagate(task, &active, &mut work, &mut paths);
            }
            debug!(
                "Source {}: {} rays -> {} paths",
                source_index,
                source.n_rays,
                paths.len() - before
            );
        }
        paths
    }

    fn nearest_hit<'a>(
        &self,
        elements: &[(usize, &'a OpticalElement)],
        origin: Vec2,
        direction: Vec2,
    ) -> Option<(usize, &'a OpticalElement, SegmentHit)> {
        let mut best: Option<(usize, &'a OpticalElement, SegmentHit)> = None;
        for &(index, element) in elements {
            if let Some(hit) = element.hit(origin, direction, self.options.epsilon) {
                if best.as_ref().map_or(true, |(_, _, b)| hit.t < b.t) {
                    best = Some((index, element, hit));
                }
            }
        }
        best
    }

    fn propagate(
        &self,
        mut task: RayTask,
        elements: &[(usize, &OpticalElement)],
        work: &mut Vec<RayTask>,
        paths: &mut Vec<RayPath>,
    ) {
        loop {
            let Some((index, element, hit)) = self.nearest_hit(elements, task.origin, task.direction)
            else {
                paths.push(task.finish(Termination::Escaped));
                return;
            };
            if task.remaining == 0 {
                paths.push(task.finish(Termination::BudgetExhausted));
                return;
            }
            task.remaining -= 1;
            task.origin = hit.point;
            task.path.points.push(to_array(&hit.point));

            let incident = IncidentRay {
                direction: task.direction,
                polarization: task.polarization,
                medium_n: task.medium_n,
                mirrored: task.mirrored,
            };
            match interact(&element.kind, &hit, &incident) {
                Interaction::Continue(out) => {
                    let intensity = task.intensity * out.power();
                    if intensity <= self.options.min_intensity {
                        paths.push(task.close(Termination::Absorbed));
                        return;
                    }
                    trace!(
                        "{} #{} at ({:.3}, {:.3}): I={:.4}",
                        element.kind.name(),
                        index,
                        hit.point.x,
                        hit.point.y,
                        intensity
                    );
                    task.apply(&out, intensity);
                    task.record(index, &out);
                }
                Interaction::Split { transmitted, reflected } => {
                    let children: Vec<RayTask> = [reflected, transmitted]
                        .iter()
                        .filter_map(|out| {
                            let intensity = task.intensity * out.power();
                            if intensity <= self.options.min_intensity {
                                return None;
                            }
                            let mut child = task.fork(out, intensity);
                            child.record(index, out);
                            Some(child)
                        })
                        .collect();
                    trace!(
                        "{} #{} at ({:.3}, {:.3}): split into {} branches",
                        element.kind.name(),
                        index,
                        hit.point.x,
                        hit.point.y,
                        children.len()
                    );
                    if children.is_empty() {
                        paths.push(task.close(Termination::Absorbed));
                    } else {
                        work.extend(children);
                    }
                    return;
                }
            }
        }
    }
}

/// Initial rays of a source, spread evenly across its aperture and fan.
fn emit_rays(source: &SourceParams, source_index: usize, max_events: usize) -> Vec<RayTask> {
    let polarization = source.polarization.to_polarization();
    let frame = Transform::placement(source.x_mm, source.y_mm, deg2rad(source.angle_deg));

    (0..source.n_rays)
        .map(|i| {
            let fraction = if source.n_rays > 1 {
                i as f64 / (source.n_rays - 1) as f64 - 0.5
            } else {
                0.0
            };
            // Lateral offsets lie along the local +y axis of the source frame.
            let origin = frame.apply(&Vec2::new(0.0, fraction * source.size_mm));
            let direction =
                frame.apply_vector(&unit_from_angle(deg2rad(fraction * source.spread_deg)));
            RayTask {
                origin,
                direction,
                polarization,
                intensity: 1.0,
                medium_n: source.medium_n,
                mirrored: false,
                remaining: max_events,
                path: RayPath {
                    points: vec![to_array(&origin)],
                    intensity: 1.0,
                    polarization,
                    initial_polarization: polarization,
                    source_index,
                    wavelength_nm: source.wavelength_nm,
                    events: Vec::new(),
                    termination: Termination::Escaped,
                },
                ray_length_mm: source.ray_length_mm,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_emitted_fan_spans_aperture_and_spread() {
        let source = SourceParams {
            n_rays: 3,
            size_mm: 4.0,
            spread_deg: 10.0,
            ..SourceParams::new(0.0, 0.0, 0.0)
        };
        let rays = emit_rays(&source, 0, 5);
        assert_eq!(rays.len(), 3);
        assert_abs_diff_eq!(rays[0].origin.y, -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rays[2].origin.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rays[0].direction.y.atan2(rays[0].direction.x), deg2rad(-5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(rays[1].direction.x, 1.0, epsilon = 1e-12);
        assert!(rays.iter().all(|r| r.remaining == 5 && r.intensity == 1.0));
    }

    #[test]
    fn test_zero_rays_emits_nothing() {
        let source = SourceParams { n_rays: 0, ..SourceParams::new(0.0, 0.0, 0.0) };
        assert!(trace(&[], &[source], 4).is_empty());
    }

    #[test]
    fn test_free_ray_gets_final_segment() {
        let source = SourceParams { ray_length_mm: 25.0, ..SourceParams::new(1.0, 2.0, 90.0) };
        let paths = trace(&[], &[source], 4);
        assert_eq!(paths.len(), 1);
        let p = &paths[0];
        assert_eq!(p.points.len(), 2);
        assert_abs_diff_eq!(p.points[1][0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.points[1][1], 27.0, epsilon = 1e-12);
        assert_eq!(p.termination, Termination::Escaped);
    }

    #[test]
    fn test_zero_budget_never_interacts() {
        let mirror = OpticalElement::mirror([-5.0, 0.0], [5.0, 0.0]);
        let paths = trace(&[mirror], &[SourceParams::new(0.0, -10.0, 90.0)], 0);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].points.len(), 2);
        assert!(paths[0].events.is_empty());
        assert_eq!(paths[0].termination, Termination::BudgetExhausted);
    }

    #[test]
    fn test_parallel_mirrors_stop_at_budget() {
        let elements = [
            OpticalElement::mirror([-5.0, 0.0], [5.0, 0.0]),
            OpticalElement::mirror([-5.0, 10.0], [5.0, 10.0]),
        ];
        let paths = trace(&elements, &[SourceParams::new(0.0, 5.0, 90.0)], 7);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].events.len(), 7);
        assert_eq!(paths[0].points.len(), 9);
        assert_eq!(paths[0].termination, Termination::BudgetExhausted);
    }
}
