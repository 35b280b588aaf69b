//! Map a new observation into the target frame with a known rotation.

use crate::observation::CelestialObservation;
use crate::rotation::{rotate, AngleTriple};
use crate::CartesianPoint;

/// Convert `observation` to Cartesian and rotate it by `angles` (radians).
///
/// The angles come from a previous [`calibrate`](crate::calibrate) run or from
/// constants recorded elsewhere; this function has no optimizer dependency.
pub fn predict(observation: &CelestialObservation, angles: &AngleTriple) -> CartesianPoint {
    rotate(&observation.to_cartesian(), angles)
}
