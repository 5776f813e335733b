//! TOML configuration deserialisation for trace jobs.

use anyhow::Context;
use serde::Deserialize;

use optrace_core::tracer::TraceOptions;
use optrace_core::types::{OpticalElement, SourceParams};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default, rename = "element")]
    pub elements: Vec<OpticalElement>,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceParams>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Tracer settings from TOML.
#[derive(Debug, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_min_intensity")]
    pub min_intensity: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            epsilon: default_epsilon(),
            min_intensity: default_min_intensity(),
        }
    }
}

impl TraceConfig {
    pub fn options(&self) -> TraceOptions {
        TraceOptions {
            max_events: self.max_events,
            epsilon: self.epsilon,
            min_intensity: self.min_intensity,
        }
    }
}

fn default_max_events() -> usize {
    TraceOptions::default().max_events
}
fn default_epsilon() -> f64 {
    TraceOptions::default().epsilon
}
fn default_min_intensity() -> f64 {
    TraceOptions::default().min_intensity
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save paths as JSON (default: true).
    #[serde(default = "default_true")]
    pub save_json: bool,
    /// Whether to also save per-vertex CSV (default: false).
    #[serde(default)]
    pub save_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_json: true,
            save_csv: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Parse a TOML job description.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid job file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use optrace_core::types::ElementKind;

    const JOB: &str = r#"
        [trace]
        max_events = 6

        [[element]]
        kind = "mirror"
        p1 = [-5.0, 0.0]
        p2 = [5.0, 0.0]

        [[element]]
        kind = "waveplate"
        p1 = [-5.0, -10.0]
        p2 = [5.0, -10.0]
        phase_shift_deg = 90.0
        fast_axis_deg = 45.0

        [[element]]
        kind = "refractive_interface"
        p1 = [20.0, -5.0]
        p2 = [20.0, 5.0]
        n1 = 1.0
        n2 = 1.5
        radius_mm = 30.0

        [[source]]
        x_mm = 0.0
        y_mm = -20.0
        angle_deg = 90.0
        polarization = { state = "horizontal" }

        [output]
        save_csv = true
    "#;

    #[test]
    fn test_parse_full_job() {
        let job = parse_config(JOB).unwrap();
        assert_eq!(job.trace.max_events, 6);
        assert_eq!(job.trace.options().epsilon, TraceOptions::default().epsilon);
        assert_eq!(job.elements.len(), 3);
        assert_eq!(job.elements[0].kind, ElementKind::Mirror);
        match &job.elements[2].kind {
            ElementKind::RefractiveInterface(ri) => {
                assert_eq!(ri.radius_mm, Some(30.0));
                assert!(ri.is_beam_splitter);
            }
            other => panic!("expected refractive interface, got {:?}", other),
        }
        assert_eq!(job.sources.len(), 1);
        assert!(job.output.save_json);
        assert!(job.output.save_csv);
        assert_eq!(job.output.directory, "./output");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let bad = r#"
            [[element]]
            kind = "prism"
            p1 = [0.0, 0.0]
            p2 = [1.0, 0.0]
        "#;
        assert!(parse_config(bad).is_err());
    }
}
