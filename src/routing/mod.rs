mod direct;
mod error;
mod types;

pub use direct::{DirectRouter, RoutingConfig};
pub use error::RoutingError;
pub use types::{Instruction, Route, RouteSummary};

use std::future::Future;

use crate::geo::Coordinate;

/// External route computation. Implementations own the pathfinding; the tracker
/// only asks for a route through an ordered list of waypoints.
pub trait RoutingService: Send + Sync + 'static {
    fn compute_route(
        &self,
        waypoints: &[Coordinate],
    ) -> impl Future<Output = Result<Route, RoutingError>> + Send;
}
