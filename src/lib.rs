//! # starchaser
//!
//! Calibrate a 3-axis rotation that maps **equatorial star coordinates**
//! (right ascension, declination, distance) onto the Cartesian frame of an
//! external application, then use it to place new stars in that frame.
//!
//! Given a handful of reference stars whose positions in the target frame are
//! known, `starchaser` finds the rotation angles that best align the
//! celestial-derived Cartesian positions with those targets.
//!
//! ## Features
//!
//! - **Sexagesimal input**: validated RA (h m s) and Dec (° ′ ″) with explicit
//!   handling of the sign of zero-degree declinations
//! - **Fixed-order rotation**: Z by `alpha`, then Y by `beta`, then X by `gamma`
//! - **Robust objective**: sum of Euclidean residuals, not squared error
//! - **Quasi-Newton fit**: BFGS with analytic gradients and a weak-Wolfe line
//!   search; the result always reports whether it converged
//! - **Degeneracy warnings**: empty, duplicate, collinear or origin-bound
//!   reference points are flagged rather than silently accepted
//!
//! ## Example
//!
//! ```
//! use starchaser::{calibrate, predict, AngleTriple, CalibrateConfig, CelestialObservation};
//!
//! let stars = vec![
//!     CelestialObservation::from_sexagesimal((1.0, 10.0, 0.0), (20.0, 0.0, 0.0), 12.0)?,
//!     CelestialObservation::from_sexagesimal((5.0, 30.0, 15.0), (-45.0, 30.0, 0.0), 40.0)?,
//!     CelestialObservation::from_sexagesimal((11.0, 0.0, 30.0), (70.0, 5.0, 5.0), 7.5)?,
//! ];
//!
//! // Targets generated from a known rotation, standing in for measured positions.
//! let truth = AngleTriple::new(0.3, -0.2, 0.1);
//! let targets: Vec<_> = stars.iter().map(|s| predict(s, &truth)).collect();
//!
//! let result = calibrate(&stars, &targets, &CalibrateConfig::default())?;
//! assert!(result.converged);
//! assert!(result.total_error < 1e-6);
//!
//! let new_star = CelestialObservation::from_sexagesimal((5.0, 6.0, 27.23), (4.0, 1.0, 26.0), 645.09)?;
//! let position = predict(&new_star, &result.angles);
//! # let _ = position;
//! # Ok::<(), starchaser::CalibrationError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. **Conversion**: `(RA, Dec, D)` to `(D cos δ cos α, D cos δ sin α, D sin δ)`
//! 2. **Rotation**: `R = Rx(γ)·Ry(β)·Rz(α)` applied stage by stage
//! 3. **Objective**: `Σᵢ ‖R pᵢ − tᵢ‖` over the reference pairs
//! 4. **Calibration**: unconstrained BFGS from an initial guess (default zero)
//! 5. **Prediction**: conversion then rotation with the calibrated angles
//!
//! Enable the `parallel` feature to evaluate the objective's per-star loop on a
//! rayon thread pool.

pub mod calibration;
pub mod error;
pub mod observation;
pub mod predict;
pub mod rotation;
pub mod tables;

pub use calibration::{
    calibrate, calibrate_reference_set, evaluate, CalibrateConfig, CalibrationResult,
    DegenerateInput, ReferenceSet, Termination,
};
pub use error::{CalibrationError, Result};
pub use observation::{
    celestial_to_cartesian, to_cartesian, CelestialObservation, Declination, RightAscension, Sign,
};
pub use predict::predict;
pub use rotation::{rotate, rotate_x, rotate_y, rotate_z, AngleTriple, AngleUnit};
pub use tables::{
    load_reference_table_from_file, parse_reference_table, ReferenceStar, ReferenceTable,
};

/// A position in a right-handed Cartesian frame, in the distance unit of the
/// observations.
// Double precision throughout: reference distances reach tens of thousands of
// light-years and the fit needs sub-unit residuals.
pub type CartesianPoint = nalgebra::Vector3<f64>;
/// A [`CartesianPoint`] in the destination frame.
pub type TargetPoint = CartesianPoint;
