//! Equatorial observations and their conversion to Cartesian coordinates.
//!
//! Right ascension is given in sexagesimal hours (1 h = 15°) and declination in
//! sexagesimal degrees. Both are validated at construction, so a
//! [`CelestialObservation`] that exists always converts to meaningful geometry.
//!
//! # Declination sign
//!
//! [`Declination::new`] takes the sign from the whole-degrees field, and minutes
//! and seconds only contribute magnitude. A declination such as `-0°30'` cannot be
//! expressed that way (`-0.0` compares equal to `0.0` and reads as positive).
//! Use [`Declination::with_sign`] to carry the sign explicitly.

use crate::error::{CalibrationError, Result};
use crate::CartesianPoint;

/// Sign of a sexagesimal declination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    fn factor(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

/// Right ascension as (hours, minutes, seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RightAscension {
    hours: f64,
    minutes: f64,
    seconds: f64,
}

impl RightAscension {
    /// Hours must be in `[0, 24)`, minutes and seconds in `[0, 60)`.
    ///
    /// Hours of 24 or more are rejected, not wrapped, so a mistyped table row
    /// fails loudly. Apply `hours.rem_euclid(24.0)` first if the source really
    /// means a full turn.
    pub fn new(hours: f64, minutes: f64, seconds: f64) -> Result<Self> {
        if !hours.is_finite() || !(0.0..24.0).contains(&hours) {
            return Err(CalibrationError::invalid_observation(format!(
                "right ascension hours {hours} not in [0, 24)"
            )));
        }
        check_sexagesimal("right ascension", "minutes", minutes)?;
        check_sexagesimal("right ascension", "seconds", seconds)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    pub fn minutes(&self) -> f64 {
        self.minutes
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn to_degrees(&self) -> f64 {
        (self.hours + self.minutes / 60.0 + self.seconds / 3600.0) * 15.0
    }

    pub fn to_radians(&self) -> f64 {
        self.to_degrees().to_radians()
    }
}

/// Declination as a sign plus (degrees, minutes, seconds) magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Declination {
    sign: Sign,
    degrees: f64,
    minutes: f64,
    seconds: f64,
}

impl Declination {
    /// Sign is taken from `degrees` alone; it is negative only when `degrees < 0`.
    ///
    /// A zero-degree southern declination (e.g. `-0°30'`) comes out positive.
    /// This matches the sexagesimal convention of the tables this crate consumes;
    /// use [`Declination::with_sign`] for those values.
    pub fn new(degrees: f64, minutes: f64, seconds: f64) -> Result<Self> {
        let sign = if degrees < 0.0 {
            Sign::Negative
        } else {
            Sign::Positive
        };
        Self::with_sign(sign, degrees.abs(), minutes, seconds)
    }

    /// Explicitly signed declination. `degrees` is the magnitude and must be
    /// non-negative; the total angle must not exceed 90°.
    pub fn with_sign(sign: Sign, degrees: f64, minutes: f64, seconds: f64) -> Result<Self> {
        if !degrees.is_finite() || !(0.0..=90.0).contains(&degrees) {
            return Err(CalibrationError::invalid_observation(format!(
                "declination degrees magnitude {degrees} not in [0, 90]"
            )));
        }
        check_sexagesimal("declination", "minutes", minutes)?;
        check_sexagesimal("declination", "seconds", seconds)?;
        let dec = Self {
            sign,
            degrees,
            minutes,
            seconds,
        };
        if dec.magnitude_degrees() > 90.0 {
            return Err(CalibrationError::invalid_observation(format!(
                "declination {:.6}° exceeds 90°",
                dec.magnitude_degrees()
            )));
        }
        Ok(dec)
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    pub fn minutes(&self) -> f64 {
        self.minutes
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    fn magnitude_degrees(&self) -> f64 {
        self.degrees + self.minutes / 60.0 + self.seconds / 3600.0
    }

    pub fn to_degrees(&self) -> f64 {
        self.sign.factor() * self.magnitude_degrees()
    }

    pub fn to_radians(&self) -> f64 {
        self.to_degrees().to_radians()
    }
}

/// A star position in equatorial coordinates with a distance along the line of sight.
///
/// Distance units are whatever the target frame uses (light-years for the
/// bundled reference table). Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialObservation {
    ra: RightAscension,
    dec: Declination,
    distance: f64,
}

impl CelestialObservation {
    /// Distance must be finite and strictly positive; zero collapses the star
    /// onto the origin and a negative value reflects it through the origin.
    pub fn new(ra: RightAscension, dec: Declination, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(CalibrationError::invalid_observation(format!(
                "distance {distance} must be finite and > 0"
            )));
        }
        Ok(Self { ra, dec, distance })
    }

    /// Build from raw sexagesimal triples, with the declination sign taken from
    /// its degrees field (see [`Declination::new`]).
    pub fn from_sexagesimal(
        ra: (f64, f64, f64),
        dec: (f64, f64, f64),
        distance: f64,
    ) -> Result<Self> {
        Self::new(
            RightAscension::new(ra.0, ra.1, ra.2)?,
            Declination::new(dec.0, dec.1, dec.2)?,
            distance,
        )
    }

    pub fn ra(&self) -> &RightAscension {
        &self.ra
    }

    pub fn dec(&self) -> &Declination {
        &self.dec
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Cartesian position with +X toward RA 0h on the equator, +Z toward the
    /// north celestial pole.
    pub fn to_cartesian(&self) -> CartesianPoint {
        celestial_to_cartesian(self.ra.to_radians(), self.dec.to_radians(), self.distance)
    }
}

/// Convert an observation to Cartesian coordinates.
pub fn to_cartesian(observation: &CelestialObservation) -> CartesianPoint {
    observation.to_cartesian()
}

/// Spherical (RA, Dec in radians, distance) to Cartesian.
pub fn celestial_to_cartesian(ra_rad: f64, dec_rad: f64, distance: f64) -> CartesianPoint {
    let (rasin, racos) = ra_rad.sin_cos();
    let (decsin, deccos) = dec_rad.sin_cos();
    CartesianPoint::new(
        distance * deccos * racos,
        distance * deccos * rasin,
        distance * decsin,
    )
}

fn check_sexagesimal(quantity: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..60.0).contains(&value) {
        return Err(CalibrationError::invalid_observation(format!(
            "{quantity} {field} {value} not in [0, 60)"
        )));
    }
    Ok(())
}
