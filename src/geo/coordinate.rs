use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CoordinateError;

/// Mean Earth radius (IUGG), meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS-84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !lng.is_finite() {
            return Err(CoordinateError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat_rad(&self) -> f64 {
        self.lat.to_radians()
    }

    pub fn lng_rad(&self) -> f64 {
        self.lng.to_radians()
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat_rad();
        let lat2 = other.lat_rad();
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

        // Rounding can push h a hair above 1 for antipodal points.
        2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }

    /// Initial bearing towards `other`, degrees in [0, 360).
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat_rad();
        let lat2 = other.lat_rad();
        let dlng = (other.lng - self.lng).to_radians();

        let y = dlng.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Point reached by travelling `distance_m` along the great circle starting at
    /// `bearing_deg`. Longitude is normalised to [-180, 180).
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> Coordinate {
        let delta = distance_m / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let lat1 = self.lat_rad();
        let lng1 = self.lng_rad();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lng2 = lng1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        Coordinate {
            lat: lat2.to_degrees(),
            lng: (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
        }
    }

    /// Point at `fraction` (0.0 ..= 1.0) of the way to `other` along the great circle.
    pub fn interpolate(&self, other: &Coordinate, fraction: f64) -> Coordinate {
        if fraction <= 0.0 {
            return *self;
        }
        if fraction >= 1.0 {
            return *other;
        }
        let total = self.distance_to(other);
        self.destination(self.bearing_to(other), total * fraction)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.split(',').map(|p| p.trim()).collect();
        if parts.len() != 2 {
            return Err(CoordinateError::InvalidFormat(s.to_string()));
        }
        let lat = parts[0]
            .parse()
            .map_err(|_| CoordinateError::InvalidNumber(parts[0].to_string()))?;
        let lng = parts[1]
            .parse()
            .map_err(|_| CoordinateError::InvalidNumber(parts[1].to_string()))?;
        Coordinate::new(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let points = [
            c(14.5995, 120.9842),
            c(14.6091, 120.9884),
            c(-33.8688, 151.2093),
            c(51.5074, -0.1278),
            c(89.9, 45.0),
        ];
        for a in &points {
            assert_eq!(a.distance_to(a), 0.0);
            for b in &points {
                assert!((a.distance_to(b) - b.distance_to(a)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn manila_points_are_just_over_a_kilometer_apart() {
        let start = c(14.5995, 120.9842);
        let destination = c(14.6091, 120.9884);
        let d = start.distance_to(&destination);
        assert!(d > 1100.0 && d < 1250.0, "distance was {d}");
    }

    #[test]
    fn distance_crosses_antimeridian_the_short_way() {
        let west = c(0.0, 179.9);
        let east = c(0.0, -179.9);
        let d = west.distance_to(&east);
        // 0.2 degrees of arc on the equator
        assert!((d - 22_239.0).abs() < 50.0, "distance was {d}");
    }

    #[test]
    fn distance_near_pole_ignores_longitude_spread() {
        let a = c(90.0, 0.0);
        let b = c(90.0, 120.0);
        assert!(a.distance_to(&b) < 1e-6);
    }

    #[test]
    fn destination_round_trips_distance_and_bearing() {
        let origin = c(14.6091, 120.9884);
        let target = origin.destination(90.0, 2_000.0);
        assert!((origin.distance_to(&target) - 2_000.0).abs() < 0.5);
        assert!((origin.bearing_to(&target) - 90.0).abs() < 0.1);
    }

    #[test]
    fn destination_wraps_longitude() {
        let origin = c(0.0, 179.99);
        let target = origin.destination(90.0, 5_000.0);
        assert!(target.lng < -179.0);
    }

    #[test]
    fn interpolate_midpoint_is_halfway() {
        let a = c(14.5995, 120.9842);
        let b = c(14.6091, 120.9884);
        let mid = a.interpolate(&b, 0.5);
        let total = a.distance_to(&b);
        assert!((a.distance_to(&mid) - total / 2.0).abs() < 0.5);
        assert_eq!(a.interpolate(&b, 1.0), b);
    }

    #[test]
    fn parses_lat_lng_pairs() {
        let parsed: Coordinate = " 14.5995 , 120.9842 ".parse().unwrap();
        assert_eq!(parsed, c(14.5995, 120.9842));
        assert!(matches!(
            "14.5".parse::<Coordinate>(),
            Err(CoordinateError::InvalidFormat(_))
        ));
        assert!(matches!(
            "abc,1".parse::<Coordinate>(),
            Err(CoordinateError::InvalidNumber(_))
        ));
        assert!(matches!(
            "91,1".parse::<Coordinate>(),
            Err(CoordinateError::LatitudeOutOfRange(_))
        ));
    }
}
