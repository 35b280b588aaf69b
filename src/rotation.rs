//! Fixed-order 3-axis rotation: Z by `alpha`, then Y by `beta`, then X by `gamma`.
//!
//! Each stage rotates the output of the previous one, so the composed matrix is
//!
//! ```text
//! R = Rx(γ) · Ry(β) · Rz(α)
//! ```
//!
//! The order matters: the stages do not commute, and this is not the classical
//! X-Y-Z extrinsic Euler sequence.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use nalgebra::Matrix3;

use crate::CartesianPoint;

/// Unit used when presenting or reading an angle triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            AngleUnit::Degrees => "deg",
            AngleUnit::Radians => "rad",
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for AngleUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deg" | "degree" | "degrees" => Ok(AngleUnit::Degrees),
            "rad" | "radian" | "radians" => Ok(AngleUnit::Radians),
            other => Err(format!("unknown angle unit '{other}' (expected deg or rad)")),
        }
    }
}

/// Rotation state in radians. Unbounded; never normalized internally.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleTriple {
    /// Rotation about Z, applied first.
    pub alpha: f64,
    /// Rotation about Y, applied second.
    pub beta: f64,
    /// Rotation about X, applied last.
    pub gamma: f64,
}

impl AngleTriple {
    pub const ZERO: AngleTriple = AngleTriple {
        alpha: 0.0,
        beta: 0.0,
        gamma: 0.0,
    };

    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub fn from_degrees(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self::new(alpha.to_radians(), beta.to_radians(), gamma.to_radians())
    }

    /// Interpret three values in the given unit.
    pub fn from_unit(values: [f64; 3], unit: AngleUnit) -> Self {
        match unit {
            AngleUnit::Degrees => Self::from_degrees(values[0], values[1], values[2]),
            AngleUnit::Radians => Self::new(values[0], values[1], values[2]),
        }
    }

    pub fn to_degrees(&self) -> [f64; 3] {
        [
            self.alpha.to_degrees(),
            self.beta.to_degrees(),
            self.gamma.to_degrees(),
        ]
    }

    pub fn to_unit(&self, unit: AngleUnit) -> [f64; 3] {
        match unit {
            AngleUnit::Degrees => self.to_degrees(),
            AngleUnit::Radians => [self.alpha, self.beta, self.gamma],
        }
    }

    /// Each angle wrapped into `[0, 2π)`. Same rotation, easier to read.
    pub fn normalized(&self) -> Self {
        Self::new(
            self.alpha.rem_euclid(TAU),
            self.beta.rem_euclid(TAU),
            self.gamma.rem_euclid(TAU),
        )
    }

    /// Composed rotation matrix `Rx(γ)·Ry(β)·Rz(α)`.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        let (sg, cg) = self.gamma.sin_cos();
        let rz = Matrix3::new(ca, -sa, 0.0, sa, ca, 0.0, 0.0, 0.0, 1.0);
        let ry = Matrix3::new(cb, 0.0, sb, 0.0, 1.0, 0.0, -sb, 0.0, cb);
        let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, cg, -sg, 0.0, sg, cg);
        rx * ry * rz
    }

    /// Formatter that prints the triple in `unit` with an explicit unit tag.
    pub fn display_in(&self, unit: AngleUnit) -> AngleDisplay {
        AngleDisplay {
            values: self.to_unit(unit),
            unit,
        }
    }

    pub(crate) fn as_array(&self) -> [f64; 3] {
        [self.alpha, self.beta, self.gamma]
    }

    pub(crate) fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// See [`AngleTriple::display_in`].
#[derive(Debug, Clone, Copy)]
pub struct AngleDisplay {
    values: [f64; 3],
    unit: AngleUnit,
}

impl fmt::Display for AngleDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, g] = self.values;
        let u = self.unit;
        write!(f, "alpha = {a} {u}, beta = {b} {u}, gamma = {g} {u}")
    }
}

/// Rotate about Z: `x' = x cosα − y sinα`, `y' = x sinα + y cosα`.
pub fn rotate_z(p: &CartesianPoint, alpha: f64) -> CartesianPoint {
    let (s, c) = alpha.sin_cos();
    CartesianPoint::new(p.x * c - p.y * s, p.x * s + p.y * c, p.z)
}

/// Rotate about Y: `x' = x cosβ + z sinβ`, `z' = −x sinβ + z cosβ`.
pub fn rotate_y(p: &CartesianPoint, beta: f64) -> CartesianPoint {
    let (s, c) = beta.sin_cos();
    CartesianPoint::new(p.x * c + p.z * s, p.y, -p.x * s + p.z * c)
}

/// Rotate about X: `y' = y cosγ − z sinγ`, `z' = y sinγ + z cosγ`.
pub fn rotate_x(p: &CartesianPoint, gamma: f64) -> CartesianPoint {
    let (s, c) = gamma.sin_cos();
    CartesianPoint::new(p.x, p.y * c - p.z * s, p.y * s + p.z * c)
}

/// Apply the Z, Y, X stages in order.
pub fn rotate(point: &CartesianPoint, angles: &AngleTriple) -> CartesianPoint {
    let p = rotate_z(point, angles.alpha);
    let p = rotate_y(&p, angles.beta);
    rotate_x(&p, angles.gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<CartesianPoint> {
        vec![
            CartesianPoint::new(1.0, 0.0, 0.0),
            CartesianPoint::new(0.0, -2.5, 0.0),
            CartesianPoint::new(3.0, 4.0, 12.0),
            CartesianPoint::new(-322.6875, -212.4375, 194.59375),
            CartesianPoint::new(1e4, -3e3, 7.5),
        ]
    }

    fn sample_angles() -> Vec<AngleTriple> {
        vec![
            AngleTriple::new(0.3, -1.2, 2.1),
            AngleTriple::from_degrees(-318.0, 228.3, 226.7),
            AngleTriple::new(10.0, 0.0, -7.5),
            AngleTriple::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_zero_angles_identity() {
        for p in sample_points() {
            let r = rotate(&p, &AngleTriple::ZERO);
            assert_eq!(r, p);
        }
    }

    #[test]
    fn test_norm_preserved() {
        for p in sample_points() {
            for a in sample_angles() {
                let r = rotate(&p, &a);
                assert!(
                    (r.norm() - p.norm()).abs() < 1e-9 * p.norm().max(1.0),
                    "norm changed: {} -> {}",
                    p.norm(),
                    r.norm()
                );
            }
        }
    }

    #[test]
    fn test_stage_inverses() {
        for p in sample_points() {
            let tol = 1e-9 * p.norm().max(1.0);
            for angle in [0.7, -2.3, 5.0] {
                let z = rotate_z(&rotate_z(&p, angle), -angle);
                let y = rotate_y(&rotate_y(&p, angle), -angle);
                let x = rotate_x(&rotate_x(&p, angle), -angle);
                assert!((z - p).norm() < tol);
                assert!((y - p).norm() < tol);
                assert!((x - p).norm() < tol);
            }
        }
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let r = rotate(
            &CartesianPoint::new(1.0, 0.0, 0.0),
            &AngleTriple::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0),
        );
        assert!((r - CartesianPoint::new(0.0, 1.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn test_matrix_matches_stages() {
        for p in sample_points() {
            for a in sample_angles() {
                let staged = rotate(&p, &a);
                let via_matrix = a.rotation_matrix() * p;
                assert!(
                    (staged - via_matrix).norm() < 1e-9 * p.norm().max(1.0),
                    "stage/matrix mismatch for {:?}",
                    a
                );
            }
        }
    }

    #[test]
    fn test_matrix_matches_nalgebra_axis_rotations() {
        use nalgebra::{Rotation3, Vector3};
        let a = AngleTriple::new(0.4, -0.9, 1.7);
        let expected = Rotation3::from_axis_angle(&Vector3::x_axis(), a.gamma)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), a.beta)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), a.alpha);
        let diff = a.rotation_matrix() - expected.matrix();
        assert!(diff.norm() < 1e-12, "diff norm {}", diff.norm());
    }

    #[test]
    fn test_order_is_not_commutative() {
        let p = CartesianPoint::new(1.0, 2.0, 3.0);
        let a = AngleTriple::new(0.5, 0.8, 1.1);
        let zyx = rotate(&p, &a);
        let xyz = rotate_z(&rotate_y(&rotate_x(&p, a.gamma), a.beta), a.alpha);
        assert!((zyx - xyz).norm() > 1e-3);
    }

    #[test]
    fn test_normalized_same_rotation() {
        let a = AngleTriple::from_degrees(-318.00443284172417, 228.3296119276629, 586.0);
        let n = a.normalized();
        for v in n.as_array() {
            assert!((0.0..TAU).contains(&v));
        }
        assert!((n.alpha.to_degrees() - 41.99556715827583).abs() < 1e-9);
        let p = CartesianPoint::new(5.0, -1.0, 2.0);
        assert!((rotate(&p, &a) - rotate(&p, &n)).norm() < 1e-12);
    }

    #[test]
    fn test_unit_roundtrip_and_display() {
        let a = AngleTriple::from_unit([90.0, -45.0, 180.0], AngleUnit::Degrees);
        assert!((a.alpha - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        let text = a.display_in(AngleUnit::Degrees).to_string();
        assert!(text.contains("deg"), "{text}");
        assert_eq!("rad".parse::<AngleUnit>(), Ok(AngleUnit::Radians));
        assert_eq!("Degrees".parse::<AngleUnit>(), Ok(AngleUnit::Degrees));
        assert!("turns".parse::<AngleUnit>().is_err());
    }
}
