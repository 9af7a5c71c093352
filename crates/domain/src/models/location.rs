//! Geographic point shared by offers and business profiles.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks both coordinates are within range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        shared::validation::validate_latitude(self.latitude)?;
        shared::validation::validate_longitude(self.longitude)
    }

    /// Great-circle distance to `other`, in kilometers.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let from: Point<f64> = (*self).into();
        let to: Point<f64> = (*other).into();
        from.haversine_distance(&to) / 1000.0
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        // geo points are (x = longitude, y = latitude)
        Point::new(p.longitude, p.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let plaza = GeoPoint::new(-33.4372, -70.6506);
        assert!(plaza.distance_km(&plaza) < 1e-9);
    }

    #[test]
    fn test_distance_between_santiago_points() {
        // Plaza de Armas to Providencia, roughly 4 km apart
        let plaza = GeoPoint::new(-33.4372, -70.6506);
        let providencia = GeoPoint::new(-33.4263, -70.6100);
        let d = plaza.distance_km(&providencia);
        assert!(d > 3.5 && d < 4.5, "unexpected distance {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(-33.4489, -70.6693);
        let b = GeoPoint::new(-33.4172, -70.6062);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_validate() {
        assert!(GeoPoint::new(-33.44, -70.66).validate().is_ok());
        assert!(GeoPoint::new(-91.0, -70.66).validate().is_err());
        assert!(GeoPoint::new(-33.44, 181.0).validate().is_err());
    }
}
