use serde::Serialize;

use super::Coordinate;

/// Circular boundary around the destination. The radius is the distance between the
/// destination and the user at the moment tracking began.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Geofence {
    pub center: Coordinate,
    pub radius_m: f64,
}

impl Geofence {
    pub fn new(center: Coordinate, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// Fence centered on `destination` whose edge passes through `start`.
    pub fn from_start(destination: Coordinate, start: Coordinate) -> Self {
        Self::new(destination, destination.distance_to(&start))
    }

    pub fn distance_from_center(&self, point: &Coordinate) -> f64 {
        self.center.distance_to(point)
    }

    /// Inclusive containment: a point exactly on the edge is inside.
    pub fn is_within(&self, point: &Coordinate) -> bool {
        self.distance_from_center(point) <= self.radius_m
    }
}
