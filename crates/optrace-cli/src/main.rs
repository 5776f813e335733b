//! optrace command-line interface.
//!
//! Trace optical layouts described in TOML job files:
//! ```sh
//! optrace-cli trace job.toml
//! optrace-cli validate job.toml
//! optrace-cli inspect job.toml --x 0 --y -5
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optrace-cli")]
#[command(about = "optrace: 2D ray tracing with Jones-calculus polarization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace a layout from a TOML job file.
    Trace {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a job file without tracing it.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Report intensity and Stokes parameters at a point.
    Inspect {
        /// Path to the job configuration file.
        config: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Maximum distance (mm) from the point to a path.
        #[arg(short, long, default_value_t = 1.0)]
        tolerance: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Trace { config, output } => {
            println!("optrace");
            println!("=======");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let paths = runner::run_trace(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
            if job.output.save_json {
                runner::write_paths_json(&paths, &out_dir.join("paths.json"))?;
            }
            if job.output.save_csv {
                runner::write_paths_csv(&paths, &out_dir.join("paths.csv"))?;
            }

            println!("Trace complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let problems = runner::element_problems(&job);
            if problems.is_empty() {
                println!("Configuration is valid: {}", config.display());
            } else {
                println!("Configuration parsed with {} warning(s):", problems.len());
                for problem in problems {
                    println!("  {}", problem);
                }
            }
            Ok(())
        }
        Commands::Inspect { config, x, y, tolerance } => {
            let job = config::load_config(&config)?;
            match runner::inspect(&job, [x, y], tolerance)? {
                Some(report) => println!("{}", report),
                None => println!("No path within {} mm of ({}, {})", tolerance, x, y),
            }
            Ok(())
        }
    }
}
