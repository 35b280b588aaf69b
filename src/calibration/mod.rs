//! Rotation calibration from reference stars.
//!
//! Given stars whose target-frame positions are known, [`calibrate`] fits the
//! [`AngleTriple`] that minimises the summed Euclidean residual between the
//! rotated celestial positions and the targets.
//!
//! The fit is a local quasi-Newton (BFGS) search from
//! [`CalibrateConfig::initial_angles`], with the three angles as free,
//! unbounded parameters and analytic gradients. A result is always returned;
//! check [`CalibrationResult::converged`] before trusting it.
//!
//! The objective has a kink wherever a residual is zero, and at an exact fit
//! every residual is. The gradient norm does not shrink near such a minimum, so
//! those runs end on the step tolerance rather than the gradient tolerance.

pub mod bfgs;
pub mod objective;

use nalgebra::Vector3;
use tracing::{info, warn};

use crate::error::Result;
use crate::observation::CelestialObservation;
use crate::predict::predict;
use crate::rotation::AngleTriple;
use crate::{CartesianPoint, TargetPoint};

use bfgs::{minimize, BfgsConfig};

pub use bfgs::Termination;
pub use objective::{evaluate, DegenerateInput, ReferenceSet};

/// Configuration for rotation calibration.
#[derive(Debug, Clone)]
pub struct CalibrateConfig {
    /// Starting guess in radians. Default (0, 0, 0).
    pub initial_angles: AngleTriple,
    /// Converged once the largest gradient component is at or below this. Default 1e-5.
    pub gradient_tolerance: f64,
    /// BFGS iteration budget. Default 600.
    pub max_iterations: u32,
    /// Converged once no step longer than this (relative to `max(1, |angles|∞)`)
    /// lowers the total error. Default 1e-14.
    pub step_tolerance: f64,
}

impl Default for CalibrateConfig {
    fn default() -> Self {
        let bfgs = BfgsConfig::default();
        Self {
            initial_angles: AngleTriple::ZERO,
            gradient_tolerance: bfgs.gradient_tolerance,
            max_iterations: bfgs.max_iterations,
            step_tolerance: bfgs.step_tolerance,
        }
    }
}

impl CalibrateConfig {
    fn bfgs(&self) -> BfgsConfig {
        BfgsConfig {
            gradient_tolerance: self.gradient_tolerance,
            max_iterations: self.max_iterations,
            step_tolerance: self.step_tolerance,
        }
    }
}

/// Result of a calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    /// Fitted angles in radians, as returned by the optimizer (not normalized).
    pub angles: AngleTriple,
    /// Euclidean residual per reference star at `angles`, in table order.
    pub per_star_residual: Vec<f64>,
    /// Sum of `per_star_residual`.
    pub total_error: f64,
    /// Objective at the initial guess.
    pub initial_error: f64,
    /// Reference stars rotated by `angles`, in table order.
    pub transformed: Vec<CartesianPoint>,
    /// Whether the optimizer met its convergence criterion.
    pub converged: bool,
    pub termination: Termination,
    pub iterations: u32,
    /// Objective value evaluations.
    pub evaluations: u32,
    pub gradient_evaluations: u32,
    /// Ill-conditioning detected in the reference set.
    pub degeneracies: Vec<DegenerateInput>,
}

impl CalibrationResult {
    /// Apply the fitted rotation to a new observation.
    pub fn predict(&self, observation: &CelestialObservation) -> CartesianPoint {
        predict(observation, &self.angles)
    }
}

/// Fit the rotation angles mapping `observations` onto `targets`.
///
/// The tables must have equal length and pair up in order; otherwise this
/// fails with [`TableLengthMismatch`](crate::CalibrationError::TableLengthMismatch)
/// before any computation.
pub fn calibrate(
    observations: &[CelestialObservation],
    targets: &[TargetPoint],
    config: &CalibrateConfig,
) -> Result<CalibrationResult> {
    let reference = ReferenceSet::new(observations, targets)?;
    Ok(calibrate_reference_set(&reference, config))
}

/// Fit against an already paired reference set.
pub fn calibrate_reference_set(
    reference: &ReferenceSet,
    config: &CalibrateConfig,
) -> CalibrationResult {
    let degeneracies = reference.degeneracies();

    let x0 = Vector3::from(config.initial_angles.as_array());
    let initial_error = reference.total_error(&config.initial_angles);

    let minimum = minimize(reference, x0, &config.bfgs());

    let angles = AngleTriple::from_array(minimum.x.into());
    let per_star_residual = reference.residuals(&angles);
    let total_error: f64 = per_star_residual.iter().sum();
    let converged = minimum.termination.is_converged();

    if converged {
        info!(
            "Calibration converged ({:?}) after {} iterations: {}, total error {:.6} -> {:.6}",
            minimum.termination,
            minimum.iterations,
            angles.display_in(crate::AngleUnit::Degrees),
            initial_error,
            total_error
        );
    } else {
        warn!(
            "Calibration did not converge ({:?}) after {} iterations, |g|∞ = {:.3e}; returning best attempt with total error {:.6}",
            minimum.termination,
            minimum.iterations,
            minimum.gradient.amax(),
            total_error
        );
    }

    CalibrationResult {
        angles,
        per_star_residual,
        total_error,
        initial_error,
        transformed: reference.transformed(&angles),
        converged,
        termination: minimum.termination,
        iterations: minimum.iterations,
        evaluations: minimum.evaluations,
        gradient_evaluations: minimum.gradient_evaluations,
        degeneracies,
    }
}
