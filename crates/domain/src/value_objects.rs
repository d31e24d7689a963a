//! Small value types shared across entities.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoord {
    pub lat: f64,
    pub lng: f64,
}

impl GpsCoord {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_meters(&self, other: &GpsCoord) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = GpsCoord::new(52.52, 13.405);
        assert!(p.distance_meters(&p) < 1e-6);
    }

    #[test]
    fn known_distance_within_tolerance() {
        // Brandenburg Gate to Berlin TV tower, roughly 2.2 km.
        let gate = GpsCoord::new(52.5163, 13.3777);
        let tower = GpsCoord::new(52.5208, 13.4094);
        let d = gate.distance_meters(&tower);
        assert!((2000.0..2500.0).contains(&d), "got {d}");
    }
}
