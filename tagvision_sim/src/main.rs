// tagvision_sim/src/main.rs

//! Runs one scenario end to end and prints the estimation error report.
//!
//! `cargo run -p tagvision_sim -- --scenario assets/scenarios/01_circle_two_tags.toml`

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tagvision_sim::cli::Cli;
use tagvision_sim::simulation::core::runner::SimulationRunner;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level when both are present.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut runner = match SimulationRunner::from_scenario_file(&cli.scenario) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let summary = runner.run(&cli.run_options());
    println!("{summary}");
    ExitCode::SUCCESS
}
