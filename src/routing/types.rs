use serde::Serialize;
use utoipa::ToSchema;

use crate::geo::Coordinate;

const FEET_PER_METER: f64 = 3.28084;

/// One turn-by-turn step, tied to the coordinate where it applies.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Instruction {
    pub index: usize,
    pub text: String,
    pub reference_point: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RouteSummary {
    pub total_distance_m: f64,
    pub total_time_s: f64,
}

impl RouteSummary {
    pub fn distance_km(&self) -> f64 {
        self.total_distance_m / 1000.0
    }

    pub fn distance_ft(&self) -> f64 {
        self.total_distance_m * FEET_PER_METER
    }

    pub fn time_min(&self) -> f64 {
        self.total_time_s / 60.0
    }

    /// "1.2 km | 1180 m | 3871.4 ft", every unit scaled from the same meter value.
    pub fn distance_text(&self) -> String {
        format!(
            "{:.1} km | {:.0} m | {:.1} ft",
            self.distance_km(),
            self.total_distance_m,
            self.distance_ft()
        )
    }

    pub fn time_text(&self) -> String {
        format!("Time: {:.1} min", self.time_min())
    }
}

/// A computed route. Immutable once produced; re-anchoring yields a new one.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Route {
    pub waypoints: Vec<Coordinate>,
    pub summary: RouteSummary,
    pub instructions: Vec<Instruction>,
    /// Full line geometry for map overlays.
    pub geometry: Vec<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_units_derive_from_meters() {
        let summary = RouteSummary {
            total_distance_m: 1180.0,
            total_time_s: 120.0,
        };
        assert_eq!(summary.distance_text(), "1.2 km | 1180 m | 3871.4 ft");
        assert_eq!(summary.time_text(), "Time: 2.0 min");
    }
}
