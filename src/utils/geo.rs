//! Geodesic distance helpers for lat/lon coordinates.
//!
//! Distances are great-circle (haversine) in miles; service radii and
//! spacing constraints throughout the optimizer are expressed in miles.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to another coordinate in miles.
    pub fn distance_miles(&self, other: &Coordinate) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_MILES * c
    }
}

/// Anything with a fixed position on the map.
pub trait Positioned {
    fn coordinate(&self) -> Coordinate;

    fn within_miles<T: Positioned>(&self, other: &T, radius: f64) -> bool {
        self.coordinate().distance_miles(&other.coordinate()) <= radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let a = Coordinate::new(34.05, -118.24);
        assert!(a.distance_miles(&a) < 1e-6);
    }

    #[test]
    fn test_known_distance() {
        // Los Angeles city hall to Santa Monica pier, roughly 15 miles.
        let downtown = Coordinate::new(34.0537, -118.2428);
        let pier = Coordinate::new(34.0086, -118.4973);
        let dist = downtown.distance_miles(&pier);
        assert!(
            dist > 13.0 && dist < 17.0,
            "expected ~15 miles, got {}",
            dist
        );
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(34.05, -118.24);
        let b = Coordinate::new(34.10, -118.30);
        assert!((a.distance_miles(&b) - b.distance_miles(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_validity() {
        assert!(Coordinate::new(34.0, -118.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, -118.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
    }
}
