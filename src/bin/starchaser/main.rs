//! starchaser: celestial-to-target-frame rotation calibration CLI
//!
//! `calibrate` fits rotation angles from a reference table; `predict` applies
//! recorded angles to a single star. The two share no state: angles are handed
//! over on the command line with an explicit unit.

mod calibrate;
mod cli;
mod predict;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Calibrate(args) => calibrate::run(args),
        Commands::Predict(args) => predict::run(args),
    }
}
