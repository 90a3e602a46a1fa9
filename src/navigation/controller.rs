use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::NavError;
use super::event::TrackerEvent;
use super::session::{RouteRequest, RouteResponse, RouteSession};
use super::stepper::{DirectionStepper, StepOutcome, StepPhase, StepPolicy};
use super::types::TrackedPosition;
use crate::geo::{Coordinate, Geofence};
use crate::position::PositionError;
use crate::routing::{Instruction, Route, RoutingService};

/// The live tracking session: fence, route and step progress for one destination.
#[derive(Debug)]
struct NavigationSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    destination: Coordinate,
    geofence: Geofence,
    route: RouteSession,
    /// Detached (`None`) once the directions run out, until the next route arrives.
    stepper: Option<DirectionStepper>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub destination: Coordinate,
    pub geofence: Geofence,
    pub route: Option<Route>,
    pub current_instruction: Option<Instruction>,
    /// Zero-based position in the instruction list, absent once directions ran out.
    pub step_index: Option<usize>,
    pub step_count: usize,
    pub directions_complete: bool,
}

/// Owns the tracked position and the navigation session, and turns position updates,
/// routing results and user commands into [`TrackerEvent`]s.
///
/// Routing for re-anchors is not awaited here: `on_position_update` hands back a
/// [`RouteRequest`] for the runtime to execute, and the result comes back through
/// `on_route_response`.
pub struct TrackerController<R> {
    router: Arc<R>,
    policy: StepPolicy,
    events: mpsc::UnboundedSender<TrackerEvent>,
    position: Option<TrackedPosition>,
    sequence: u64,
    destination: Option<Coordinate>,
    session: Option<NavigationSession>,
    /// Last route generation handed out, carried across sessions so a late response
    /// from a stopped session can never match a newer one.
    generation: u64,
}

impl<R: RoutingService> TrackerController<R> {
    pub fn new(
        router: Arc<R>,
        policy: StepPolicy,
        events: mpsc::UnboundedSender<TrackerEvent>,
    ) -> Self {
        Self {
            router,
            policy,
            events,
            position: None,
            sequence: 0,
            destination: None,
            session: None,
            generation: 0,
        }
    }

    pub fn router(&self) -> Arc<R> {
        self.router.clone()
    }

    pub fn position(&self) -> Option<TrackedPosition> {
        self.position
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|s| SessionSnapshot {
            id: s.id,
            started_at: s.started_at,
            destination: s.destination,
            geofence: s.geofence,
            route: s.route.current().cloned(),
            current_instruction: s.stepper.as_ref().and_then(|st| st.current().cloned()),
            step_index: s
                .stepper
                .as_ref()
                .filter(|st| st.phase() == StepPhase::Active)
                .map(|st| st.index()),
            step_count: match (&s.stepper, s.route.current()) {
                (Some(st), _) => st.len(),
                (None, Some(route)) => route.instructions.len(),
                (None, None) => 0,
            },
            directions_complete: s.route.current().is_some() && s.stepper.is_none(),
        })
    }

    /// Pick a new destination. Any running session belonged to the old one and ends.
    pub fn set_destination(&mut self, destination: Coordinate) {
        self.stop();
        log::info!("destination set to {}", destination);
        self.destination = Some(destination);
    }

    pub fn clear_destination(&mut self) {
        self.stop();
        if self.destination.take().is_some() {
            log::info!("destination cleared");
        }
    }

    /// Begin tracking towards `destination` (or the one already selected).
    ///
    /// Nothing is created unless both a fix and a route are available.
    pub async fn start(
        &mut self,
        destination: Option<Coordinate>,
    ) -> Result<SessionSnapshot, NavError> {
        if let Some(destination) = destination {
            self.set_destination(destination);
        } else {
            self.stop();
        }

        let position = self.position.ok_or(NavError::NoPositionFix)?;
        let destination = self.destination.ok_or(NavError::NoDestination)?;
        let origin = position.coordinate;

        let mut route_session = RouteSession::resume_from(self.generation);
        let anchored = route_session
            .anchor(self.router.as_ref(), origin, destination)
            .await;
        self.generation = route_session.generation();
        let route = anchored.inspect_err(|e| {
            log::warn!("could not start tracking: {}", e);
            self.emit(TrackerEvent::error(e));
        })?;

        let geofence = Geofence::from_start(destination, origin);
        let id = Uuid::new_v4();
        log::info!(
            "tracking session {} started: {} -> {}, fence radius {:.0} m",
            id,
            origin,
            destination,
            geofence.radius_m
        );

        self.session = Some(NavigationSession {
            id,
            started_at: Utc::now(),
            destination,
            geofence,
            route: route_session,
            stepper: None,
        });
        self.route_found(route);

        self.snapshot().ok_or(NavError::NoRouteFound)
    }

    /// Handle one position fix. The order of effects is fixed: replace the position,
    /// check the fence, re-anchor the route, then advance the directions.
    pub fn on_position_update(&mut self, point: Coordinate) -> Option<RouteRequest> {
        self.sequence += 1;
        let tracked = TrackedPosition {
            coordinate: point,
            sequence: self.sequence,
            timestamp: Utc::now(),
        };
        self.position = Some(tracked);
        self.emit(TrackerEvent::PositionUpdated { position: tracked });

        let session = self.session.as_mut()?;
        let mut events = Vec::new();

        let distance_m = session.geofence.distance_from_center(&point);
        if !session.geofence.is_within(&point) {
            log::warn!(
                "position {} is {:.0} m from destination, outside fence of {:.0} m",
                point,
                distance_m,
                session.geofence.radius_m
            );
            events.push(TrackerEvent::GeofenceViolated {
                position: point,
                distance_m,
                radius_m: session.geofence.radius_m,
            });
        }

        let request = session.route.reanchor(point);
        self.generation = request.generation;

        if session.route.current().is_some() {
            if let Some(stepper) = session.stepper.as_mut() {
                match stepper.advance(&point) {
                    StepOutcome::Advanced(instruction) | StepOutcome::Repeated(instruction) => {
                        events.push(TrackerEvent::StepAdvanced { instruction });
                    }
                    StepOutcome::Exhausted => {
                        log::info!("directions exhausted, detaching stepper");
                        session.stepper = None;
                        events.push(TrackerEvent::DirectionsCompleted);
                    }
                    StepOutcome::Idle => {}
                }
            }
        }

        for event in events {
            self.emit(event);
        }
        Some(request)
    }

    pub fn on_route_response(&mut self, response: RouteResponse) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("route response {} arrived with no session", response.generation);
            return;
        };
        match session.route.complete(response) {
            None => {}
            Some(Ok(route)) => self.route_found(route),
            Some(Err(e)) => {
                log::warn!("re-route failed, keeping previous route: {}", e);
                self.emit(TrackerEvent::error(&e));
            }
        }
    }

    /// Surface a position-source failure. A denied permission ends the session and
    /// forgets the fix, so tracking cannot carry on without one.
    pub fn on_position_error(&mut self, error: PositionError) {
        let err = NavError::from(error);
        log::warn!("position source error: {}", err);
        self.emit(TrackerEvent::error(&err));

        if error.is_terminal() {
            self.stop();
            self.position = None;
        }
    }

    /// End the session. Returns false (and emits nothing) if none was running.
    pub fn stop(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.generation = self.generation.max(session.route.generation());
        log::info!("tracking session {} stopped", session.id);
        self.emit(TrackerEvent::TrackingStopped {
            session_id: session.id,
        });
        true
    }

    /// A new route replaces step progress: the stepper restarts at the first
    /// instruction and announces it straight away.
    fn route_found(&mut self, route: Route) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        log::info!(
            "route found: {} ({})",
            route.summary.distance_text(),
            route.summary.time_text()
        );

        let mut stepper = DirectionStepper::new(route.instructions.clone(), self.policy);
        let first = stepper.start();
        session.stepper = first.as_ref().map(|_| stepper);

        self.emit(TrackerEvent::RouteFound { route });
        match first {
            Some(instruction) => self.emit(TrackerEvent::StepAdvanced { instruction }),
            None => self.emit(TrackerEvent::DirectionsCompleted),
        }
    }

    fn emit(&self, event: TrackerEvent) {
        log::debug!("emit {}", event.name());
        if self.events.send(event).is_err() {
            log::debug!("event receiver dropped");
        }
    }
}
