//! `starchaser calibrate`

use anyhow::bail;
use starchaser::{
    calibrate, load_reference_table_from_file, AngleTriple, AngleUnit, CalibrateConfig,
};

use crate::cli::CalibrateArgs;

pub fn run(args: &CalibrateArgs) -> anyhow::Result<()> {
    let table = load_reference_table_from_file(&args.table)?;
    if table.is_empty() {
        bail!("reference table {} has no stars", args.table.display());
    }

    let initial_angles = match args.initial.as_deref() {
        Some(&[a, b, g]) => AngleTriple::from_unit([a, b, g], args.input_unit),
        Some(other) => bail!("--initial needs 3 values, got {}", other.len()),
        None => AngleTriple::ZERO,
    };

    let config = CalibrateConfig {
        initial_angles,
        gradient_tolerance: args.gradient_tolerance,
        max_iterations: args.max_iterations,
        step_tolerance: args.step_tolerance,
    };

    let result = calibrate(&table.observations(), &table.targets(), &config)?;

    println!("Optimized angles: {}", result.angles.display_in(args.output_unit));
    if args.normalize {
        println!(
            "Normalized:       {}",
            result.angles.normalized().display_in(args.output_unit)
        );
    }
    println!(
        "Status: {} ({:?}, {} iterations, {} evaluations, {} gradients)",
        if result.converged { "converged" } else { "NOT converged" },
        result.termination,
        result.iterations,
        result.evaluations,
        result.gradient_evaluations
    );
    println!(
        "Total error: {:.6} (initial {:.6})",
        result.total_error, result.initial_error
    );
    for warning in &result.degeneracies {
        println!("Warning: {warning}");
    }

    println!();
    println!("Transformed coordinates for each star:");
    for ((name, star), (transformed, residual)) in table.names().zip(&table.stars).zip(
        result
            .transformed
            .iter()
            .zip(&result.per_star_residual),
    ) {
        let t = &star.target;
        println!("{name}");
        println!("  Target:      ({}, {}, {})", t.x, t.y, t.z);
        println!(
            "  Transformed: ({}, {}, {})",
            transformed.x, transformed.y, transformed.z
        );
        println!("  Residual:    {residual:.6}");
    }

    if args.output_unit == AngleUnit::Degrees {
        let [a, b, g] = result.angles.to_degrees();
        println!();
        println!("Predict with: --angles {a} {b} {g} --angle-unit deg");
    } else {
        let AngleTriple { alpha, beta, gamma } = result.angles;
        println!();
        println!("Predict with: --angles {alpha} {beta} {gamma} --angle-unit rad");
    }

    Ok(())
}
