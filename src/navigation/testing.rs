//! Routers and helpers shared by the navigation tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use super::event::TrackerEvent;
use crate::geo::Coordinate;
use crate::routing::{Instruction, Route, RouteSummary, RoutingError, RoutingService};

pub fn c(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<TrackerEvent>) -> Vec<TrackerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn names(events: &[TrackerEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}

/// Returns a straight route with a fixed number of instructions, or a fixed error.
pub struct ScriptedRouter {
    pub steps: usize,
    pub error: Option<RoutingError>,
    pub calls: AtomicUsize,
}

impl ScriptedRouter {
    pub fn with_steps(steps: usize) -> Arc<Self> {
        Arc::new(Self {
            steps,
            error: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: RoutingError) -> Arc<Self> {
        Arc::new(Self {
            steps: 0,
            error: Some(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn scripted_route(waypoints: &[Coordinate], steps: usize) -> Route {
    let origin = waypoints[0];
    let destination = waypoints[waypoints.len() - 1];
    let distance = origin.distance_to(&destination);
    Route {
        waypoints: waypoints.to_vec(),
        summary: RouteSummary {
            total_distance_m: distance,
            total_time_s: distance / 10.0,
        },
        instructions: (0..steps)
            .map(|i| Instruction {
                index: i,
                text: format!("step {i}"),
                reference_point: origin.interpolate(&destination, i as f64 / steps as f64),
            })
            .collect(),
        geometry: vec![origin, destination],
    }
}

impl RoutingService for ScriptedRouter {
    async fn compute_route(&self, waypoints: &[Coordinate]) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(scripted_route(waypoints, self.steps)),
        }
    }
}

/// Answers the first request at once and holds every later one until released.
pub struct GatedRouter {
    pub steps: usize,
    pub gate: Notify,
    pub calls: AtomicUsize,
}

impl GatedRouter {
    pub fn new(steps: usize) -> Arc<Self> {
        Arc::new(Self {
            steps,
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl RoutingService for GatedRouter {
    async fn compute_route(&self, waypoints: &[Coordinate]) -> Result<Route, RoutingError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            self.gate.notified().await;
        }
        Ok(scripted_route(waypoints, self.steps))
    }
}
