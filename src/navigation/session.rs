use super::error::NavError;
use crate::geo::Coordinate;
use crate::routing::{Route, RoutingError, RoutingService};

/// A route computation handed to the runtime. The generation identifies which
/// request a response belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub generation: u64,
    pub waypoints: Vec<Coordinate>,
}

impl RouteRequest {
    pub async fn execute<R: RoutingService>(self, router: &R) -> RouteResponse {
        let result = router.compute_route(&self.waypoints).await;
        RouteResponse {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub generation: u64,
    pub result: Result<Route, RoutingError>,
}

/// Waypoints of the active route request and the last route computed for them.
#[derive(Debug, Clone, Default)]
pub struct RouteSession {
    waypoints: Vec<Coordinate>,
    current: Option<Route>,
    generation: u64,
}

impl RouteSession {
    /// Empty session whose first request continues after `generation`.
    pub fn resume_from(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request a fresh route `[origin, destination]` and wait for it. Failures are
    /// returned as-is; nothing is retried.
    pub async fn anchor<R: RoutingService>(
        &mut self,
        router: &R,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, NavError> {
        self.waypoints = vec![origin, destination];
        let request = self.next_request();
        let response = request.execute(router).await;
        match self.complete(response) {
            Some(result) => result,
            // Only reachable if another request was issued while this one awaited.
            None => Err(NavError::RoutingUnavailable("superseded".into())),
        }
    }

    /// Move the first waypoint and build the recompute request. The current route
    /// stays in place until a matching response arrives.
    pub fn reanchor(&mut self, origin: Coordinate) -> RouteRequest {
        match self.waypoints.first_mut() {
            Some(first) => *first = origin,
            None => self.waypoints.push(origin),
        }
        self.next_request()
    }

    /// Apply a routing response. Returns `None` for a stale generation, which is
    /// dropped without touching the current route.
    pub fn complete(&mut self, response: RouteResponse) -> Option<Result<Route, NavError>> {
        if response.generation != self.generation {
            log::debug!(
                "dropping stale route response (generation {}, current {})",
                response.generation,
                self.generation
            );
            return None;
        }
        Some(match response.result {
            Ok(route) => {
                self.current = Some(route.clone());
                Ok(route)
            }
            Err(e) => Err(e.into()),
        })
    }

    fn next_request(&mut self) -> RouteRequest {
        self.generation += 1;
        RouteRequest {
            generation: self.generation,
            waypoints: self.waypoints.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::DirectRouter;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    struct Unreachable;

    impl RoutingService for Unreachable {
        async fn compute_route(&self, _waypoints: &[Coordinate]) -> Result<Route, RoutingError> {
            Err(RoutingError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn anchor_requests_exactly_two_waypoints() {
        let router = DirectRouter::default();
        let mut session = RouteSession::default();
        let origin = c(14.5995, 120.9842);
        let destination = c(14.6091, 120.9884);

        let route = session.anchor(&router, origin, destination).await.unwrap();
        assert_eq!(route.waypoints, vec![origin, destination]);
        assert_eq!(session.current(), Some(&route));
        assert_eq!(session.generation(), 1);
    }

    #[tokio::test]
    async fn anchor_failure_is_reported_and_leaves_no_route() {
        let mut session = RouteSession::default();
        let err = session
            .anchor(&Unreachable, c(0.0, 0.0), c(0.0, 0.1))
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::RoutingUnavailable(_)));
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn stale_response_is_dropped() {
        let router = DirectRouter::default();
        let mut session = RouteSession::default();
        let destination = c(14.6091, 120.9884);
        let original = session
            .anchor(&router, c(14.5995, 120.9842), destination)
            .await
            .unwrap();

        let old = session.reanchor(c(14.60, 120.985));
        let new = session.reanchor(c(14.605, 120.986));
        assert!(new.generation > old.generation);

        let old_response = old.execute(&router).await;
        assert_eq!(session.complete(old_response), None);
        // Previous route is still current while the newer request is pending.
        assert_eq!(session.current(), Some(&original));

        let new_response = new.execute(&router).await;
        let route = session.complete(new_response).unwrap().unwrap();
        assert_eq!(route.waypoints[0], c(14.605, 120.986));
        assert_eq!(route.waypoints[1], destination);
    }

    #[tokio::test]
    async fn reanchor_with_same_origin_is_idempotent() {
        let router = DirectRouter::default();
        let mut session = RouteSession::default();
        session
            .anchor(&router, c(14.5995, 120.9842), c(14.6091, 120.9884))
            .await
            .unwrap();

        let origin = c(14.602, 120.985);
        let first = session.reanchor(origin).execute(&router).await;
        let first = session.complete(first).unwrap().unwrap();
        let second = session.reanchor(origin).execute(&router).await;
        let second = session.complete(second).unwrap().unwrap();

        assert_eq!(first.summary, second.summary);
    }

    #[tokio::test]
    async fn failed_reanchor_keeps_previous_route() {
        let router = DirectRouter::default();
        let mut session = RouteSession::default();
        let route = session
            .anchor(&router, c(0.0, 0.0), c(0.0, 0.01))
            .await
            .unwrap();

        let request = session.reanchor(c(0.0, 0.001));
        let failed = request.execute(&Unreachable).await;
        assert!(matches!(
            session.complete(failed),
            Some(Err(NavError::RoutingUnavailable(_)))
        ));
        assert_eq!(session.current(), Some(&route));
    }
}
