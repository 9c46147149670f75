//! Geographic position value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// A `[longitude, latitude]` pair of finite numbers.
///
/// Serialized as a two-element JSON array, the GeoJSON `Point` coordinate
/// order used by the fleet store and the map clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinates {
    longitude: f64,
    latitude: f64,
}

impl Coordinates {
    /// Creates coordinates, rejecting NaN and infinities.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, ValidationError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(ValidationError::invalid_format(
                "coordinates",
                "longitude and latitude must be finite numbers",
            ));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Builds coordinates from a raw `[longitude, latitude]` slice.
    pub fn from_slice(raw: &[f64]) -> Result<Self, ValidationError> {
        match raw {
            [longitude, latitude] => Self::new(*longitude, *latitude),
            _ => Err(ValidationError::invalid_format(
                "coordinates",
                format!("expected [longitude, latitude], got {} values", raw.len()),
            )),
        }
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn to_array(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
        }
    }
}

impl TryFrom<Vec<f64>> for Coordinates {
    type Error = ValidationError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&value)
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        c.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_longitude_latitude_pair() {
        let c = Coordinates::from_slice(&[-73.9857, 40.7484]).unwrap();
        assert_eq!(c.longitude(), -73.9857);
        assert_eq!(c.latitude(), 40.7484);
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Coordinates::from_slice(&[]).is_err());
        assert!(Coordinates::from_slice(&[1.0]).is_err());
        assert!(Coordinates::from_slice(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinates::new(f64::NEG_INFINITY, 1.0).is_err());
    }

    #[test]
    fn serializes_as_array() {
        let c = Coordinates::new(-73.9857, 40.7484).unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "[-73.9857,40.7484]");
    }

    #[test]
    fn deserialization_enforces_arity() {
        assert!(serde_json::from_str::<Coordinates>("[1.5,2.5]").is_ok());
        assert!(serde_json::from_str::<Coordinates>("[1.5]").is_err());
    }
}
