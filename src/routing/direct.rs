use serde::Deserialize;
use std::future::Future;

use super::{Instruction, Route, RouteSummary, RoutingError, RoutingService};
use crate::geo::Coordinate;

const COMPASS_POINTS: [&str; 8] = [
    "north",
    "north-east",
    "east",
    "south-east",
    "south",
    "south-west",
    "west",
    "north-west",
];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_average_speed_kmh")]
    pub average_speed_kmh: f64,
    #[serde(default = "default_leg_length_m")]
    pub leg_length_m: f64,
}

fn default_average_speed_kmh() -> f64 {
    30.0
}

fn default_leg_length_m() -> f64 {
    500.0
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: default_average_speed_kmh(),
            leg_length_m: default_leg_length_m(),
        }
    }
}

/// Offline router that follows the great circle between waypoints.
///
/// There is no road network behind it; it exists so the tracker can run end to end
/// (replays, local testing) without a remote routing backend. Output is a pure
/// function of the input waypoints.
#[derive(Debug, Clone, Default)]
pub struct DirectRouter {
    config: RoutingConfig,
}

impl DirectRouter {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn route(&self, waypoints: &[Coordinate]) -> Result<Route, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::NoRouteFound);
        }
        if waypoints
            .iter()
            .any(|w| !w.lat.is_finite() || !w.lng.is_finite())
        {
            return Err(RoutingError::NoRouteFound);
        }
        if !(self.config.average_speed_kmh > 0.0) || !(self.config.leg_length_m > 0.0) {
            return Err(RoutingError::Unavailable(
                "router misconfigured: speed and leg length must be positive".into(),
            ));
        }

        let geometry = build_geometry(waypoints, self.config.leg_length_m);
        let total_distance_m: f64 = geometry.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
        let speed_m_s = self.config.average_speed_kmh / 3.6;

        Ok(Route {
            waypoints: waypoints.to_vec(),
            summary: RouteSummary {
                total_distance_m: round1(total_distance_m),
                total_time_s: round1(total_distance_m / speed_m_s),
            },
            instructions: build_instructions(&geometry),
            geometry,
        })
    }
}

impl RoutingService for DirectRouter {
    fn compute_route(
        &self,
        waypoints: &[Coordinate],
    ) -> impl Future<Output = Result<Route, RoutingError>> + Send {
        let result = self.route(waypoints);
        async move { result }
    }
}

/// Great-circle polyline through all waypoints, split into legs no longer than `leg_m`.
fn build_geometry(waypoints: &[Coordinate], leg_m: f64) -> Vec<Coordinate> {
    let mut points = vec![waypoints[0]];
    for pair in waypoints.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let legs = (from.distance_to(&to) / leg_m).ceil().max(1.0) as usize;
        for i in 1..=legs {
            points.push(from.interpolate(&to, i as f64 / legs as f64));
        }
    }
    points
}

fn build_instructions(geometry: &[Coordinate]) -> Vec<Instruction> {
    let last = geometry.len() - 1;
    let mut instructions = Vec::with_capacity(geometry.len());

    for i in 0..last {
        let (from, to) = (geometry[i], geometry[i + 1]);
        let leg = from.distance_to(&to);
        if leg == 0.0 {
            continue;
        }
        let heading = compass_point(from.bearing_to(&to));
        let verb = if instructions.is_empty() {
            "Head"
        } else {
            "Continue"
        };
        instructions.push(Instruction {
            index: instructions.len(),
            text: format!("{verb} {heading} for {}", format_distance(leg)),
            reference_point: from,
        });
    }

    instructions.push(Instruction {
        index: instructions.len(),
        text: "Arrive at destination".to_string(),
        reference_point: geometry[last],
    });
    instructions
}

pub fn compass_point(bearing_deg: f64) -> &'static str {
    let sector = ((bearing_deg.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    COMPASS_POINTS[sector]
}

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
