use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::NavError;
use super::types::TrackedPosition;
use crate::geo::Coordinate;
use crate::routing::{Instruction, Route};

/// Everything the presentation layer learns about the tracker arrives as one of these.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    PositionUpdated {
        position: TrackedPosition,
    },
    RouteFound {
        route: Route,
    },
    GeofenceViolated {
        position: Coordinate,
        distance_m: f64,
        radius_m: f64,
    },
    StepAdvanced {
        instruction: Instruction,
    },
    DirectionsCompleted,
    TrackingStopped {
        session_id: Uuid,
    },
    Error {
        code: String,
        message: String,
    },
}

impl TrackerEvent {
    pub fn error(err: &NavError) -> Self {
        TrackerEvent::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrackerEvent::PositionUpdated { .. } => "position_updated",
            TrackerEvent::RouteFound { .. } => "route_found",
            TrackerEvent::GeofenceViolated { .. } => "geofence_violated",
            TrackerEvent::StepAdvanced { .. } => "step_advanced",
            TrackerEvent::DirectionsCompleted => "directions_completed",
            TrackerEvent::TrackingStopped { .. } => "tracking_stopped",
            TrackerEvent::Error { .. } => "error",
        }
    }
}
