//! # Coordinates
//!
//! Geographic position parsed from the free-text `location` a provider
//! publishes in its metadata document (`"<latitude>,<longitude>"`).
//!
//! The store's earth-distance operator takes points as `(longitude, latitude)`,
//! the reverse of the published order. [`Coordinates::to_point`] renders that
//! form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mean earth radius in statute miles, as used by the store's `<@>` operator.
pub const EARTH_RADIUS_MILES: f64 = 3958.747_716;

/// Errors raised when parsing a location string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    /// The text is not two comma-separated values.
    #[error("expected '<latitude>,<longitude>', got '{0}'")]
    Format(String),

    /// A component is not a number.
    #[error("invalid {axis} '{value}'")]
    NotANumber {
        /// `latitude` or `longitude`.
        axis: &'static str,
        /// The offending text.
        value: String,
    },

    /// A component is outside its valid range.
    #[error("{axis} {value} out of range")]
    OutOfRange {
        /// `latitude` or `longitude`.
        axis: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north, in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees east, in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates coordinates after checking both ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::OutOfRange`] if either axis is out of range
    /// or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::OutOfRange {
                axis: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::OutOfRange {
                axis: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Renders the pair as a point literal, longitude first, five decimals.
    ///
    /// # Examples
    ///
    /// ```
    /// use provider_directory::domain::value_objects::coordinates::Coordinates;
    ///
    /// let c = Coordinates::new(40.0, -73.0).unwrap();
    /// assert_eq!(c.to_point(), "(-73.00000,40.00000)");
    /// ```
    #[must_use]
    pub fn to_point(&self) -> String {
        format!("({:.5},{:.5})", self.longitude, self.latitude)
    }

    /// Great-circle distance in statute miles.
    #[must_use]
    pub fn distance_miles(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoordinateError::Format(s.to_string()));
        };
        let parse = |axis: &'static str, value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| CoordinateError::NotANumber {
                    axis,
                    value: value.trim().to_string(),
                })
        };
        Self::new(parse("latitude", lat)?, parse("longitude", lon)?)
    }
}

/// Parses a free-text location into coordinates.
///
/// # Errors
///
/// Returns [`CoordinateError`] if the text is not a valid `lat,long` pair.
pub fn parse_coordinates(location: &str) -> Result<Coordinates, CoordinateError> {
    location.parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_lat_long() {
        let c = parse_coordinates("40.7128, -74.0060").unwrap();
        assert!((c.latitude - 40.7128).abs() < 1e-9);
        assert!((c.longitude + 74.006).abs() < 1e-9);
    }

    #[test]
    fn point_is_longitude_first() {
        let c = Coordinates::new(40.0, -73.0).unwrap();
        assert_eq!(c.to_point(), "(-73.00000,40.00000)");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_coordinates("somewhere in Ohio"),
            Err(CoordinateError::Format(_))
        ));
        assert!(matches!(
            parse_coordinates("north,south"),
            Err(CoordinateError::NotANumber {
                axis: "latitude",
                ..
            })
        ));
        assert!(matches!(
            parse_coordinates("1,2,3"),
            Err(CoordinateError::Format(_))
        ));
        assert!(parse_coordinates("").is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            parse_coordinates("91,0"),
            Err(CoordinateError::OutOfRange {
                axis: "latitude",
                ..
            })
        ));
        assert!(matches!(
            parse_coordinates("0,181"),
            Err(CoordinateError::OutOfRange {
                axis: "longitude",
                ..
            })
        ));
        assert!(parse_coordinates("NaN,0").is_err());
    }

    #[test]
    fn distance_new_york_to_boston() {
        let nyc = Coordinates::new(40.7128, -74.0060).unwrap();
        let boston = Coordinates::new(42.3601, -71.0589).unwrap();
        let miles = nyc.distance_miles(&boston);
        assert!((180.0..200.0).contains(&miles), "got {miles}");
        assert!(nyc.distance_miles(&nyc).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn display_then_parse(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let c = Coordinates::new(lat, lon).unwrap();
            let parsed: Coordinates = c.to_string().parse().unwrap();
            prop_assert_eq!(parsed, c);
        }
    }
}
