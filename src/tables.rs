//! Reference star tables: named observations paired with target-frame positions.
//!
//! One star per line, comma separated:
//!
//! ```text
//! # name, ra_h, ra_m, ra_s, dec_d, dec_m, dec_s, distance, target_x, target_y, target_z
//! Polaris, 3, 47, 38.553, 89, 27, 7.710, 432.58, -322.6875, -212.4375, 194.59375
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A leading `-` on the
//! declination degrees token makes the declination negative even when the
//! degrees are zero, so `-0, 30, 0` reads as `-0°30'`.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use tracing::info;

use crate::observation::{CelestialObservation, Declination, RightAscension, Sign};
use crate::TargetPoint;

const NUM_FIELDS: usize = 11;

/// One row of a reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceStar {
    pub name: String,
    pub observation: CelestialObservation,
    pub target: TargetPoint,
}

/// Ordered reference stars. Row `i` of [`observations`](Self::observations)
/// pairs with row `i` of [`targets`](Self::targets).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    pub stars: Vec<ReferenceStar>,
}

impl ReferenceTable {
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn observations(&self) -> Vec<CelestialObservation> {
        self.stars.iter().map(|s| s.observation).collect()
    }

    pub fn targets(&self) -> Vec<TargetPoint> {
        self.stars.iter().map(|s| s.target).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stars.iter().map(|s| s.name.as_str())
    }
}

/// Parse a reference table from an in-memory string.
///
/// Any malformed row aborts the parse; the error names the line.
pub fn parse_reference_table(data: &str) -> anyhow::Result<ReferenceTable> {
    let mut stars = Vec::new();
    for (idx, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let star = parse_reference_star(line).with_context(|| format!("line {}", idx + 1))?;
        stars.push(star);
    }
    Ok(ReferenceTable { stars })
}

pub fn load_reference_table_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ReferenceTable> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read reference table {}", path.display()))?;
    let table = parse_reference_table(&data)
        .with_context(|| format!("failed to parse reference table {}", path.display()))?;
    info!("Loaded {} reference stars from {}", table.len(), path.display());
    Ok(table)
}

fn parse_reference_star(line: &str) -> anyhow::Result<ReferenceStar> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != NUM_FIELDS {
        bail!("expected {} fields, found {}", NUM_FIELDS, fields.len());
    }
    let name = fields[0].to_string();
    if name.is_empty() {
        bail!("missing star name");
    }

    let ra = RightAscension::new(
        parse_number(fields[1], "ra hours")?,
        parse_number(fields[2], "ra minutes")?,
        parse_number(fields[3], "ra seconds")?,
    )?;
    let dec = parse_declination(fields[4], fields[5], fields[6])?;
    let distance = parse_number(fields[7], "distance")?;
    let observation = CelestialObservation::new(ra, dec, distance)
        .with_context(|| format!("star '{name}'"))?;

    let target = TargetPoint::new(
        parse_number(fields[8], "target x")?,
        parse_number(fields[9], "target y")?,
        parse_number(fields[10], "target z")?,
    );

    Ok(ReferenceStar {
        name,
        observation,
        target,
    })
}

/// Parse a declination from text tokens, taking the sign from a leading `-`
/// on the degrees token rather than from its numeric value.
pub fn parse_declination(
    degrees: &str,
    minutes: &str,
    seconds: &str,
) -> anyhow::Result<Declination> {
    let degrees = degrees.trim();
    let (sign, magnitude) = match degrees.strip_prefix('-') {
        Some(rest) => (Sign::Negative, rest),
        None => (Sign::Positive, degrees.strip_prefix('+').unwrap_or(degrees)),
    };
    Ok(Declination::with_sign(
        sign,
        parse_number(magnitude, "dec degrees")?,
        parse_number(minutes, "dec minutes")?,
        parse_number(seconds, "dec seconds")?,
    )?)
}

/// Parse an observation from whitespace-separated sexagesimal strings, e.g.
/// `ra = "5 6 27.23"`, `dec = "-0 30 0"`.
pub fn parse_observation(
    ra: &str,
    dec: &str,
    distance: f64,
) -> anyhow::Result<CelestialObservation> {
    let ra_tokens = split_triple(ra, "right ascension")?;
    let dec_tokens = split_triple(dec, "declination")?;
    let ra = RightAscension::new(
        parse_number(ra_tokens[0], "ra hours")?,
        parse_number(ra_tokens[1], "ra minutes")?,
        parse_number(ra_tokens[2], "ra seconds")?,
    )?;
    let dec = parse_declination(dec_tokens[0], dec_tokens[1], dec_tokens[2])?;
    Ok(CelestialObservation::new(ra, dec, distance)?)
}

fn split_triple<'a>(text: &'a str, what: &str) -> anyhow::Result<[&'a str; 3]> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|t| !t.is_empty())
        .collect();
    <[&str; 3]>::try_from(tokens.as_slice())
        .map_err(|_| anyhow!("{what} '{text}' must have three fields"))
}

fn parse_number(token: &str, field: &str) -> anyhow::Result<f64> {
    token
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid {field} '{token}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# name, ra_h, ra_m, ra_s, dec_d, dec_m, dec_s, distance, x, y, z
Polaris, 3, 47, 38.553, 89, 27, 7.710, 432.58, -322.6875, -212.4375, 194.59375

Sag A*, 17, 45, 40.055, -29, 0, 28.398, 25899.99, 25.21875, 25899.96875, -20.90625
";

    #[test]
    fn test_parse_sample() {
        let table = parse_reference_table(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["Polaris", "Sag A*"]);
        assert_eq!(table.stars[1].observation.dec().sign(), Sign::Negative);
        assert!((table.stars[1].target.y - 25899.96875).abs() < 1e-12);
        assert_eq!(table.observations().len(), table.targets().len());
    }

    #[test]
    fn test_explicit_negative_zero_degrees() {
        let dec = parse_declination("-0", "30", "0").unwrap();
        assert_eq!(dec.sign(), Sign::Negative);
        assert!((dec.to_degrees() + 0.5).abs() < 1e-12);
        let dec = parse_declination("+12", "0", "0").unwrap();
        assert!((dec.to_degrees() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_error_names_line() {
        let data = "Polaris, 3, 47, 38.553, 89, 27, 7.710, 432.58, 1, 2, 3\nBad, 3, 60, 0, 0, 0, 0, 1, 0, 0, 0\n";
        let err = parse_reference_table(data).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 2"), "{msg}");
        assert!(msg.contains("minutes"), "{msg}");
    }

    #[test]
    fn test_rejects_zero_distance_and_wrong_arity() {
        assert!(parse_reference_table("X, 1, 0, 0, 0, 0, 0, 0, 1, 2, 3").is_err());
        assert!(parse_reference_table("X, 1, 0, 0, 0, 0, 0, 5, 1, 2").is_err());
        assert!(parse_reference_table("X, 1, 0, zero, 0, 0, 0, 5, 1, 2, 3").is_err());
    }

    #[test]
    fn test_parse_observation_strings() {
        let obs = parse_observation("5 6 27.23", "4:1:26.0", 645.09).unwrap();
        assert!((obs.ra().to_degrees() - (5.0 + 6.0 / 60.0 + 27.23 / 3600.0) * 15.0).abs() < 1e-12);
        assert!((obs.distance() - 645.09).abs() < 1e-12);
        assert!(parse_observation("5 6", "4 1 26", 1.0).is_err());
        assert!(parse_observation("5 6 27", "4 1 26", 0.0).is_err());
    }
}
