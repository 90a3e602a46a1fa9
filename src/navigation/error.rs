use thiserror::Error;

use crate::position::PositionError;
use crate::routing::RoutingError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("no position fix yet")]
    NoPositionFix,
    #[error("no destination selected")]
    NoDestination,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(PositionError),
    #[error("routing service unavailable: {0}")]
    RoutingUnavailable(String),
    #[error("no route found")]
    NoRouteFound,
    #[error("navigator is not running")]
    WorkerGone,
}

impl From<RoutingError> for NavError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::Unavailable(msg) => NavError::RoutingUnavailable(msg),
            RoutingError::NoRouteFound => NavError::NoRouteFound,
        }
    }
}

impl From<PositionError> for NavError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::PermissionDenied => NavError::PermissionDenied,
            other => NavError::PositionUnavailable(other),
        }
    }
}

impl NavError {
    /// Stable machine-readable code, used in event payloads and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            NavError::NoPositionFix => "no_position_fix",
            NavError::NoDestination => "no_destination",
            NavError::PermissionDenied => "permission_denied",
            NavError::PositionUnavailable(_) => "position_unavailable",
            NavError::RoutingUnavailable(_) => "routing_unavailable",
            NavError::NoRouteFound => "no_route_found",
            NavError::WorkerGone => "worker_gone",
        }
    }
}
