//! Calibration objective: sum of Euclidean residuals between rotated reference
//! stars and their target-frame positions.
//!
//! The objective is the plain sum of L2 distances, not a mean and not a sum of
//! squares. That makes the fit less sensitive to a single bad reference star,
//! at the cost of a gradient kink wherever a residual reaches exactly zero.
//!
//! Gradients are analytic. A rotation stage about unit axis `e` has derivative
//! `e × q` at its output `q`, and later stages carry that vector along. At a
//! zero residual the star contributes nothing to the gradient.

use std::fmt;

use nalgebra::Vector3;
use tracing::warn;

use super::bfgs::Objective;
use crate::error::{CalibrationError, Result};
use crate::observation::CelestialObservation;
use crate::rotation::{rotate, rotate_x, rotate_y, rotate_z, AngleTriple};
use crate::{CartesianPoint, TargetPoint};

/// Relative tolerance used to flag coincident or parallel reference points.
const DEGENERACY_TOL: f64 = 1e-9;

/// Conditions that leave the fit ill-conditioned. Reported as warnings, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegenerateInput {
    /// No reference pairs at all; every angle triple is optimal.
    EmptyReferenceSet,
    /// Target point at the origin carries no directional information.
    TargetAtOrigin { index: usize },
    /// Two observations convert to the same Cartesian point.
    DuplicateObservation { first: usize, second: usize },
    /// Two targets are the same point.
    DuplicateTarget { first: usize, second: usize },
    /// All reference stars lie on one line through the origin, so the rotation
    /// about that line is unconstrained.
    CollinearReferences,
}

impl fmt::Display for DegenerateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateInput::EmptyReferenceSet => write!(f, "reference set is empty"),
            DegenerateInput::TargetAtOrigin { index } => {
                write!(f, "target {index} is at the origin")
            }
            DegenerateInput::DuplicateObservation { first, second } => {
                write!(f, "observations {first} and {second} coincide")
            }
            DegenerateInput::DuplicateTarget { first, second } => {
                write!(f, "targets {first} and {second} coincide")
            }
            DegenerateInput::CollinearReferences => {
                write!(f, "reference stars are collinear with the origin")
            }
        }
    }
}

/// Observation/target tables paired and converted once.
///
/// Construction enforces equal length; Cartesian positions are cached so the
/// optimizer only pays for rotation and distance on each evaluation.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    points: Vec<CartesianPoint>,
    targets: Vec<TargetPoint>,
}

impl ReferenceSet {
    pub fn new(observations: &[CelestialObservation], targets: &[TargetPoint]) -> Result<Self> {
        if observations.len() != targets.len() {
            return Err(CalibrationError::TableLengthMismatch {
                observations: observations.len(),
                targets: targets.len(),
            });
        }
        Ok(Self {
            points: observations.iter().map(|o| o.to_cartesian()).collect(),
            targets: targets.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Unrotated Cartesian positions of the observations.
    pub fn points(&self) -> &[CartesianPoint] {
        &self.points
    }

    pub fn targets(&self) -> &[TargetPoint] {
        &self.targets
    }

    /// Observations rotated by `angles`, in table order.
    pub fn transformed(&self, angles: &AngleTriple) -> Vec<CartesianPoint> {
        self.points.iter().map(|p| rotate(p, angles)).collect()
    }

    /// Per-star Euclidean residual, in table order.
    pub fn residuals(&self, angles: &AngleTriple) -> Vec<f64> {
        self.points
            .iter()
            .zip(&self.targets)
            .map(|(p, t)| residual(p, t, angles))
            .collect()
    }

    /// Sum of per-star residuals.
    #[cfg(not(feature = "parallel"))]
    pub fn total_error(&self, angles: &AngleTriple) -> f64 {
        self.points
            .iter()
            .zip(&self.targets)
            .map(|(p, t)| residual(p, t, angles))
            .sum()
    }

    /// Sum of per-star residuals, evaluated across the rayon pool.
    ///
    /// Summation order differs from the sequential build, so results agree only
    /// to floating-point tolerance.
    #[cfg(feature = "parallel")]
    pub fn total_error(&self, angles: &AngleTriple) -> f64 {
        use rayon::prelude::*;
        self.points
            .par_iter()
            .zip(self.targets.par_iter())
            .map(|(p, t)| residual(p, t, angles))
            .sum()
    }

    /// Gradient of [`total_error`](Self::total_error) with respect to
    /// `(alpha, beta, gamma)`.
    #[cfg(not(feature = "parallel"))]
    pub fn gradient(&self, angles: &AngleTriple) -> Vector3<f64> {
        self.points
            .iter()
            .zip(&self.targets)
            .fold(Vector3::zeros(), |acc, (p, t)| acc + residual_gradient(p, t, angles))
    }

    #[cfg(feature = "parallel")]
    pub fn gradient(&self, angles: &AngleTriple) -> Vector3<f64> {
        use rayon::prelude::*;
        self.points
            .par_iter()
            .zip(self.targets.par_iter())
            .map(|(p, t)| residual_gradient(p, t, angles))
            .reduce(Vector3::zeros, |a, b| a + b)
    }

    /// Inspect the reference set for conditions that make the fit ill-posed.
    pub fn degeneracies(&self) -> Vec<DegenerateInput> {
        let mut found = Vec::new();
        if self.is_empty() {
            found.push(DegenerateInput::EmptyReferenceSet);
            return found;
        }

        for (index, t) in self.targets.iter().enumerate() {
            if t.norm() <= DEGENERACY_TOL {
                found.push(DegenerateInput::TargetAtOrigin { index });
            }
        }

        for (first, second) in coincident_pairs(&self.points) {
            found.push(DegenerateInput::DuplicateObservation { first, second });
        }
        for (first, second) in coincident_pairs(&self.targets) {
            found.push(DegenerateInput::DuplicateTarget { first, second });
        }

        let axis = self.points[0];
        let collinear = self.points.iter().all(|p| {
            p.cross(&axis).norm() <= DEGENERACY_TOL * p.norm() * axis.norm()
        });
        if collinear {
            found.push(DegenerateInput::CollinearReferences);
        }

        for d in &found {
            warn!("Degenerate calibration input: {}", d);
        }
        found
    }
}

impl Objective for ReferenceSet {
    fn value(&self, x: &Vector3<f64>) -> f64 {
        self.total_error(&AngleTriple::new(x.x, x.y, x.z))
    }

    fn gradient(&self, x: &Vector3<f64>) -> Vector3<f64> {
        ReferenceSet::gradient(self, &AngleTriple::new(x.x, x.y, x.z))
    }
}

/// Objective value for `angles` over paired tables.
///
/// Fails only when the tables differ in length; observations are validated
/// when they are constructed.
pub fn evaluate(
    angles: &AngleTriple,
    observations: &[CelestialObservation],
    targets: &[TargetPoint],
) -> Result<f64> {
    Ok(ReferenceSet::new(observations, targets)?.total_error(angles))
}

#[inline]
fn residual(point: &CartesianPoint, target: &TargetPoint, angles: &AngleTriple) -> f64 {
    (rotate(point, angles) - target).norm()
}

fn residual_gradient(
    point: &CartesianPoint,
    target: &TargetPoint,
    angles: &AngleTriple,
) -> Vector3<f64> {
    let after_z = rotate_z(point, angles.alpha);
    let after_y = rotate_y(&after_z, angles.beta);
    let rotated = rotate_x(&after_y, angles.gamma);
    let r = rotated - target;
    let len = r.norm();
    if len == 0.0 {
        return Vector3::zeros();
    }
    let d_alpha = rotate_x(
        &rotate_y(&Vector3::<f64>::z().cross(&after_z), angles.beta),
        angles.gamma,
    );
    let d_beta = rotate_x(&Vector3::<f64>::y().cross(&after_y), angles.gamma);
    let d_gamma = Vector3::<f64>::x().cross(&rotated);
    Vector3::new(r.dot(&d_alpha), r.dot(&d_beta), r.dot(&d_gamma)) / len
}

fn coincident_pairs(points: &[CartesianPoint]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let scale = points[i].norm().max(points[j].norm()).max(1.0);
            if (points[i] - points[j]).norm() <= DEGENERACY_TOL * scale {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ra_h: f64, dec_d: f64, dist: f64) -> CelestialObservation {
        CelestialObservation::from_sexagesimal((ra_h, 0.0, 0.0), (dec_d, 0.0, 0.0), dist).unwrap()
    }

    #[test]
    fn test_sum_of_l2_not_squares() {
        // Two stars, each exactly 3-4-5 away from its target.
        let observations = vec![obs(0.0, 0.0, 10.0), obs(6.0, 0.0, 10.0)];
        let targets = vec![
            TargetPoint::new(10.0, 3.0, 4.0),
            TargetPoint::new(3.0, 10.0, 4.0),
        ];
        let e = evaluate(&AngleTriple::ZERO, &observations, &targets).unwrap();
        assert!((e - 10.0).abs() < 1e-9, "expected 5 + 5, got {e}");

        let set = ReferenceSet::new(&observations, &targets).unwrap();
        let r = set.residuals(&AngleTriple::ZERO);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 5.0).abs() < 1e-9 && (r[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_at_true_rotation() {
        let angles = AngleTriple::new(0.2, -0.4, 1.3);
        let observations = vec![obs(1.0, 20.0, 5.0), obs(9.0, -35.0, 50.0), obs(17.0, 60.0, 2.0)];
        let targets: Vec<TargetPoint> = observations
            .iter()
            .map(|o| rotate(&o.to_cartesian(), &angles))
            .collect();
        let e = evaluate(&angles, &observations, &targets).unwrap();
        assert!(e < 1e-12, "objective at truth = {e}");
    }

    #[test]
    fn test_gradient_matches_central_differences() {
        let observations = vec![obs(1.0, 20.0, 5.0), obs(9.0, -35.0, 50.0), obs(17.0, 60.0, 2.0)];
        let targets = vec![
            TargetPoint::new(3.0, -1.0, 2.0),
            TargetPoint::new(-20.0, 30.0, -25.0),
            TargetPoint::new(0.5, 0.5, 1.5),
        ];
        let set = ReferenceSet::new(&observations, &targets).unwrap();
        let angles = AngleTriple::new(0.7, -0.3, 2.2);
        let g = set.gradient(&angles);

        let h = 1e-6;
        for i in 0..3 {
            let mut fwd = angles.as_array();
            let mut back = angles.as_array();
            fwd[i] += h;
            back[i] -= h;
            let numeric = (set.total_error(&AngleTriple::from_array(fwd))
                - set.total_error(&AngleTriple::from_array(back)))
                / (2.0 * h);
            assert!(
                (g[i] - numeric).abs() < 1e-5 * numeric.abs().max(1.0),
                "component {i}: {} vs {numeric}",
                g[i]
            );
        }
    }

    #[test]
    fn test_gradient_ignores_matched_stars() {
        let angles = AngleTriple::new(0.2, -0.4, 1.3);
        let observations = vec![obs(1.0, 20.0, 5.0), obs(9.0, -35.0, 50.0)];
        let targets: Vec<TargetPoint> = observations
            .iter()
            .map(|o| rotate(&o.to_cartesian(), &angles))
            .collect();
        let set = ReferenceSet::new(&observations, &targets).unwrap();
        let g = set.gradient(&angles);
        assert!(g.iter().all(|v| v.is_finite()));
        assert!(g.norm() < 1e-6, "gradient at exact fit {g:?}");
    }

    #[test]
    fn test_length_mismatch() {
        let observations = vec![obs(1.0, 0.0, 1.0); 5];
        let targets = vec![TargetPoint::zeros(); 4];
        let err = evaluate(&AngleTriple::ZERO, &observations, &targets).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::TableLengthMismatch {
                observations: 5,
                targets: 4
            }
        );
    }

    #[test]
    fn test_degeneracies() {
        let empty = ReferenceSet::new(&[], &[]).unwrap();
        assert_eq!(empty.degeneracies(), vec![DegenerateInput::EmptyReferenceSet]);

        let observations = vec![obs(2.0, 10.0, 4.0), obs(2.0, 10.0, 4.0), obs(8.0, -5.0, 3.0)];
        let targets = vec![
            TargetPoint::zeros(),
            TargetPoint::new(1.0, 2.0, 3.0),
            TargetPoint::new(1.0, 2.0, 3.0),
        ];
        let d = ReferenceSet::new(&observations, &targets).unwrap().degeneracies();
        assert!(d.contains(&DegenerateInput::TargetAtOrigin { index: 0 }));
        assert!(d.contains(&DegenerateInput::DuplicateObservation { first: 0, second: 1 }));
        assert!(d.contains(&DegenerateInput::DuplicateTarget { first: 1, second: 2 }));
        assert!(!d.contains(&DegenerateInput::CollinearReferences));
    }

    #[test]
    fn test_collinear_references() {
        // Same direction at different distances.
        let observations = vec![obs(4.0, 30.0, 1.0), obs(4.0, 30.0, 7.0)];
        let targets = vec![TargetPoint::new(1.0, 0.0, 0.0), TargetPoint::new(7.0, 0.0, 0.0)];
        let d = ReferenceSet::new(&observations, &targets).unwrap().degeneracies();
        assert_eq!(d, vec![DegenerateInput::CollinearReferences]);
    }
}
