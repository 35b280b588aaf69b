//! `starchaser predict`

use anyhow::bail;
use starchaser::tables::parse_observation;
use starchaser::{predict, AngleTriple};
use tracing::debug;

use crate::cli::PredictArgs;

pub fn run(args: &PredictArgs) -> anyhow::Result<()> {
    let [a, b, g] = match args.angles.as_slice() {
        &[a, b, g] => [a, b, g],
        other => bail!("--angles needs 3 values, got {}", other.len()),
    };
    let angles = AngleTriple::from_unit([a, b, g], args.angle_unit);
    let observation = parse_observation(&args.ra, &args.dec, args.distance)?;
    debug!(
        "Predicting RA {:.6}°, Dec {:.6}°, distance {} with {}",
        observation.ra().to_degrees(),
        observation.dec().to_degrees(),
        observation.distance(),
        angles.display_in(args.angle_unit)
    );

    let p = predict(&observation, &angles);
    println!("Transformed coordinates for the new star:");
    println!("X: {}", p.x);
    println!("Y: {}", p.y);
    println!("Z: {}", p.z);
    Ok(())
}
