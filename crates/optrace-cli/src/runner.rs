//! Trace runner: ties together the job file, the tracer, and the writers.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use optrace_core::color::path_rgba;
use optrace_core::inspect::{probe_paths, Probe};
use optrace_core::tracer::RayTracer;
use optrace_core::types::{RayPath, Termination};

use crate::config::JobConfig;

/// Run the trace described by a parsed job.
pub fn run_trace(job: &JobConfig) -> Result<Vec<RayPath>> {
    if job.sources.is_empty() {
        anyhow::bail!("No sources defined; add at least one [[source]] table");
    }
    for problem in element_problems(job) {
        warn!("{}", problem);
    }

    let tracer = RayTracer::new(job.trace.options());
    let paths = tracer.trace(&job.elements, &job.sources);

    let escaped = paths.iter().filter(|p| p.termination == Termination::Escaped).count();
    let cut = paths
        .iter()
        .filter(|p| p.termination == Termination::BudgetExhausted)
        .count();
    println!(
        "  {} elements, {} sources -> {} paths ({} escaped, {} hit the event budget)",
        job.elements.len(),
        job.sources.len(),
        paths.len(),
        escaped,
        cut
    );
    Ok(paths)
}

/// Human-readable descriptions of elements that will be skipped or inert.
pub fn element_problems(job: &JobConfig) -> Vec<String> {
    job.elements
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            e.validate()
                .err()
                .map(|err| format!("Element {} ({}): {}", i, e.kind.name(), err))
        })
        .collect()
}

/// Write all paths as pretty-printed JSON.
pub fn write_paths_json(paths: &[RayPath], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(paths)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Paths written to {}", path.display());
    println!("Paths written to {}", path.display());
    Ok(())
}

/// Write one CSV row per path vertex, with the drawing colour of its path.
pub fn write_paths_csv(paths: &[RayPath], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = String::from("path,source,vertex,x_mm,y_mm,intensity,r,g,b,a\n");
    for (i, ray) in paths.iter().enumerate() {
        let [r, g, b, a] = path_rgba(ray);
        for (j, point) in ray.points.iter().enumerate() {
            let intensity = match ray.segment_state(j) {
                Some((value, _)) => value,
                None => ray.intensity,
            };
            writeln!(
                out,
                "{},{},{},{:.6},{:.6},{:.6e},{:.4},{:.4},{:.4},{:.4}",
                i, ray.source_index, j, point[0], point[1], intensity, r, g, b, a
            )?;
        }
    }
    std::fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Vertices written to {}", path.display());
    Ok(())
}

/// Format a probe result for the terminal.
pub fn describe_probe(path_index: usize, probe: &Probe) -> String {
    let s = &probe.stokes;
    format!(
        "Path {} segment {} at ({:.3}, {:.3}) mm, {:.3} mm from query\n\
         \x20 intensity  {:.6}\n\
         \x20 Stokes     S0={:.6} S1={:.6} S2={:.6} S3={:.6}\n\
         \x20 DoP        {:.4}\n\
         \x20 azimuth    {:.2} deg, ellipticity {:.2} deg",
        path_index,
        probe.segment,
        probe.point[0],
        probe.point[1],
        probe.distance,
        probe.intensity,
        s.s0,
        s.s1,
        s.s2,
        s.s3,
        s.degree_of_polarization(),
        s.azimuth().to_degrees(),
        s.ellipticity().to_degrees()
    )
}

/// Trace and probe the nearest path at `point`.
pub fn inspect(job: &JobConfig, point: [f64; 2], tolerance: f64) -> Result<Option<String>> {
    let paths = run_trace(job)?;
    Ok(probe_paths(&paths, point, tolerance).map(|(i, probe)| describe_probe(i, &probe)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_run_trace_requires_sources() {
        let job = parse_config("").unwrap();
        assert!(run_trace(&job).is_err());
    }

    #[test]
    fn test_problems_report_degenerate_elements() {
        let job = parse_config(
            r#"
            [[element]]
            kind = "lens"
            p1 = [0.0, 0.0]
            p2 = [0.0, 0.0]
            efl_mm = 50.0
            "#,
        )
        .unwrap();
        let problems = element_problems(&job);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("Degenerate"));
    }

    #[test]
    fn test_inspect_finds_reflected_light() {
        let job = parse_config(
            r#"
            [[element]]
            kind = "mirror"
            p1 = [-5.0, 0.0]
            p2 = [5.0, 0.0]

            [[source]]
            x_mm = 0.0
            y_mm = -10.0
            angle_deg = 90.0
            "#,
        )
        .unwrap();
        let report = inspect(&job, [0.2, -5.0], 1.0).unwrap().expect("path nearby");
        assert!(report.contains("S1=1.000000"));
    }
}
