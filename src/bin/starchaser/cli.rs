//! CLI argument definitions for starchaser

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use starchaser::AngleUnit;

#[derive(Parser)]
#[command(name = "starchaser")]
#[command(about = "Calibrate and apply a celestial-to-target-frame rotation")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (optimizer progress)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit rotation angles from a reference star table
    Calibrate(CalibrateArgs),

    /// Map one star into the target frame with known angles
    Predict(PredictArgs),
}

#[derive(Parser)]
pub struct CalibrateArgs {
    /// Reference table (name, RA h m s, Dec d m s, distance, target x y z per line)
    pub table: PathBuf,

    /// Initial angle guess
    #[arg(long, num_args = 3, value_names = ["ALPHA", "BETA", "GAMMA"], allow_negative_numbers = true)]
    pub initial: Option<Vec<f64>>,

    /// Unit of --initial
    #[arg(long, default_value = "deg")]
    pub input_unit: AngleUnit,

    /// Stop once the largest gradient component is at or below this
    #[arg(long, default_value = "1e-5")]
    pub gradient_tolerance: f64,

    /// Optimizer iteration budget
    #[arg(long, default_value = "600")]
    pub max_iterations: u32,

    /// Stop once no step longer than this (relative to the angles) lowers the error
    #[arg(long, default_value = "1e-14")]
    pub step_tolerance: f64,

    /// Unit for reporting the fitted angles
    #[arg(long, default_value = "deg")]
    pub output_unit: AngleUnit,

    /// Also print the fitted angles wrapped into [0, 360) / [0, 2π)
    #[arg(long)]
    pub normalize: bool,
}

#[derive(Parser)]
pub struct PredictArgs {
    /// Right ascension as "H M S"
    #[arg(long)]
    pub ra: String,

    /// Declination as "D M S"; a leading '-' marks southern declinations, including -0
    #[arg(long, allow_hyphen_values = true)]
    pub dec: String,

    /// Distance in target-frame units
    #[arg(long)]
    pub distance: f64,

    /// Calibrated angles
    #[arg(long, num_args = 3, value_names = ["ALPHA", "BETA", "GAMMA"], allow_negative_numbers = true, required = true)]
    pub angles: Vec<f64>,

    /// Unit of --angles
    #[arg(long, default_value = "deg")]
    pub angle_unit: AngleUnit,
}
