// tagvision_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::simulation::core::runner::{RunMode, RunOptions};

/// TagVision: fiducial pose estimation against a simulated camera.
///
/// This struct defines the command-line arguments accepted by the simulation binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/00_single_tag.toml")]
    pub scenario: PathBuf,

    /// Number of control cycles to run (default: duration x control rate).
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Run single-threaded on a simulated clock instead of with a camera thread.
    #[arg(long, default_value_t = false)]
    pub lockstep: bool,

    /// Simulated seconds per wall second; 0 runs unpaced.
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mode: if self.lockstep {
                RunMode::Lockstep
            } else {
                RunMode::Threaded
            },
            cycles: self.cycles,
            time_scale: self.time_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_threaded_run() {
        let cli = Cli::parse_from(["tagvision_sim"]);
        assert_eq!(cli.run_options().mode, RunMode::Threaded);
        assert_eq!(cli.log_level, "info");
        assert!(cli.cycles.is_none());
    }

    #[test]
    fn flags_map_to_run_options() {
        let cli = Cli::parse_from([
            "tagvision_sim",
            "--scenario",
            "custom.toml",
            "--lockstep",
            "--cycles",
            "25",
            "--time-scale",
            "2.5",
        ]);
        let options = cli.run_options();
        assert_eq!(cli.scenario, PathBuf::from("custom.toml"));
        assert_eq!(options.mode, RunMode::Lockstep);
        assert_eq!(options.cycles, Some(25));
        assert_eq!(options.time_scale, Some(2.5));
    }
}
