//! Gatekeeping for user-entered markers.
//!
//! Validation is pure: callers decide how to surface a rejection.

use crate::model::{Coordinates, Marker, Submission};

/// Whether coordinates must fall inside geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatePolicy {
    /// Latitude in `[-90, 90]`, longitude in `[-180, 180]`.
    #[default]
    Strict,
    /// Any finite number is accepted.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn bound(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidCoordinate {
    #[error("{axis} {raw:?} is not a number")]
    NotANumber { axis: Axis, raw: String },
    #[error("{axis} must be finite")]
    NotFinite { axis: Axis },
    #[error("{axis} {value} is outside ±{}", .axis.bound())]
    OutOfRange { axis: Axis, value: f64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidSubmission {
    #[error("enter a name")]
    MissingName,
    #[error("enter a {0}")]
    MissingField(Axis),
    #[error("invalid coordinates: {0}")]
    Coordinate(#[from] InvalidCoordinate),
}

fn parse_axis(axis: Axis, raw: &str, policy: CoordinatePolicy) -> Result<f64, InvalidCoordinate> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| InvalidCoordinate::NotANumber {
            axis,
            raw: raw.to_string(),
        })?;
    if value.is_nan() {
        return Err(InvalidCoordinate::NotANumber {
            axis,
            raw: raw.to_string(),
        });
    }
    if !value.is_finite() {
        return Err(InvalidCoordinate::NotFinite { axis });
    }
    if policy == CoordinatePolicy::Strict && value.abs() > axis.bound() {
        return Err(InvalidCoordinate::OutOfRange { axis, value });
    }
    Ok(value)
}

/// Parse a raw latitude/longitude pair. Values are returned unchanged, never clamped.
pub fn validate(
    raw_latitude: &str,
    raw_longitude: &str,
    policy: CoordinatePolicy,
) -> Result<Coordinates, InvalidCoordinate> {
    let lat = parse_axis(Axis::Latitude, raw_latitude, policy)?;
    let lon = parse_axis(Axis::Longitude, raw_longitude, policy)?;
    Ok(Coordinates::new(lat, lon))
}

/// Check a whole form submission and turn it into a marker.
pub fn validate_submission(
    submission: &Submission,
    policy: CoordinatePolicy,
) -> Result<Marker, InvalidSubmission> {
    let name = submission.name.trim();
    if name.is_empty() {
        return Err(InvalidSubmission::MissingName);
    }
    if submission.latitude.trim().is_empty() {
        return Err(InvalidSubmission::MissingField(Axis::Latitude));
    }
    if submission.longitude.trim().is_empty() {
        return Err(InvalidSubmission::MissingField(Axis::Longitude));
    }
    let coordinates = validate(&submission.latitude, &submission.longitude, policy)?;
    Ok(Marker {
        name: name.to_string(),
        coordinates,
    })
}
