use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::controller::{SessionSnapshot, TrackerController};
use super::error::NavError;
use super::event::TrackerEvent;
use super::notice::Notice;
use super::session::RouteResponse;
use super::stepper::StepPolicy;
use super::types::{Command, Reply, TrackedPosition};
use crate::geo::Coordinate;
use crate::position::{PositionEvent, PositionSource, Subscription, WatchOptions};
use crate::routing::RoutingService;

const COMMAND_QUEUE: usize = 32;
const EVENT_FANOUT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NavigationConfig {
    /// Distance to a step's reference point that counts as reaching it. Absent means
    /// every position change moves on to the next instruction.
    #[serde(default)]
    pub arrival_radius_m: Option<f64>,
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

fn default_event_log_capacity() -> usize {
    256
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: None,
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavigatorStatus {
    pub tracking: bool,
    pub position: Option<TrackedPosition>,
    pub destination: Option<Coordinate>,
    pub session: Option<SessionSnapshot>,
    pub last_event_seq: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventRecord {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: TrackerEvent,
    pub notice: Option<Notice>,
}

#[derive(Debug)]
struct Shared {
    status: NavigatorStatus,
    log: VecDeque<EventRecord>,
    capacity: usize,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Handle to the navigation worker task.
///
/// The worker owns the [`TrackerController`] and the position subscription; this
/// handle only sends commands and reads the mirrored status and event log.
pub struct Navigator {
    commands: mpsc::Sender<Command>,
    shared: Arc<StdMutex<Shared>>,
    fanout: broadcast::Sender<EventRecord>,
    worker: Option<WorkerHandle>,
}

impl Navigator {
    pub fn spawn<R, S>(router: Arc<R>, source: Arc<S>, config: NavigationConfig) -> Self
    where
        R: RoutingService,
        S: PositionSource,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = TrackerController::new(
            router,
            StepPolicy::from_arrival_radius(config.arrival_radius_m),
            events_tx,
        );

        let shared = Arc::new(StdMutex::new(Shared {
            status: NavigatorStatus {
                tracking: false,
                position: None,
                destination: None,
                session: None,
                last_event_seq: 0,
            },
            log: VecDeque::with_capacity(config.event_log_capacity),
            capacity: config.event_log_capacity.max(1),
        }));
        let (fanout, _) = broadcast::channel(EVENT_FANOUT);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (route_tx, route_rx) = mpsc::unbounded_channel();

        let subscription = source.subscribe(WatchOptions::locate());
        let worker = Worker {
            controller,
            source,
            subscription,
            route_tx,
            inflight: None,
            events: events_rx,
            shared: shared.clone(),
            fanout: fanout.clone(),
        };
        let join = tokio::spawn(worker.run(commands_rx, route_rx, stop_rx));

        Self {
            commands: commands_tx,
            shared,
            fanout,
            worker: Some(WorkerHandle { stop_tx, join }),
        }
    }

    pub fn status(&self) -> NavigatorStatus {
        self.shared.lock().unwrap().status.clone()
    }

    /// Logged events with a sequence number greater than `seq`, oldest first.
    pub fn events_since(&self, seq: u64) -> Vec<EventRecord> {
        let locked = self.shared.lock().unwrap();
        locked.log.iter().filter(|r| r.seq > seq).cloned().collect()
    }

    /// Live feed of events recorded from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventRecord> {
        self.fanout.subscribe()
    }

    pub async fn start(&self, destination: Option<Coordinate>) -> Result<SessionSnapshot, NavError> {
        self.send(|reply| Command::Start { destination, reply }).await
    }

    pub async fn stop(&self) -> Result<(), NavError> {
        self.send(|reply| Command::Stop { reply }).await
    }

    pub async fn set_destination(&self, destination: Coordinate) -> Result<(), NavError> {
        self.send(|reply| Command::SetDestination { destination, reply }).await
    }

    pub async fn clear_destination(&self) -> Result<(), NavError> {
        self.send(|reply| Command::ClearDestination { reply }).await
    }

    /// Stop the worker, ending any session and closing its subscription.
    pub async fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
    }

    async fn send<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, NavError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| NavError::WorkerGone)?;
        rx.await.map_err(|_| NavError::WorkerGone)?
    }
}

struct Worker<R, S> {
    controller: TrackerController<R>,
    source: Arc<S>,
    subscription: Subscription,
    route_tx: mpsc::UnboundedSender<RouteResponse>,
    inflight: Option<JoinHandle<()>>,
    events: mpsc::UnboundedReceiver<TrackerEvent>,
    shared: Arc<StdMutex<Shared>>,
    fanout: broadcast::Sender<EventRecord>,
}

impl<R: RoutingService, S: PositionSource> Worker<R, S> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut route_rx: mpsc::UnboundedReceiver<RouteResponse>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        // Seed from the last known fix so a start right after spawn has a position,
        // unless newer events already reached the subscription.
        let pending = self.subscription.drain_pending();
        if pending.is_empty() {
            if let Some(event) = self.source.current() {
                self.on_position_event(event);
            }
        }
        for event in pending {
            self.on_position_event(event);
        }
        self.publish();

        let mut source_open = true;
        loop {
            // Positions already delivered are applied before any command queued after them.
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                event = self.subscription.next(), if source_open => match event {
                    Some(event) => self.on_position_event(event),
                    None => {
                        log::warn!("position source closed the subscription");
                        source_open = false;
                    }
                },
                Some(response) = route_rx.recv() => self.controller.on_route_response(response),
                Some(command) = commands.recv() => {
                    self.on_command(command, &mut source_open).await;
                    continue;
                }
            }

            self.settle(&mut source_open);
        }

        self.controller.stop();
        self.cancel_inflight();
        self.publish();

        let Worker {
            source,
            subscription,
            ..
        } = self;
        source.unsubscribe(subscription);
        log::info!("navigator stopped");
    }

    /// Apply a command and answer it. Replies go out only after the resulting events
    /// are recorded, so callers see the state their command produced.
    async fn on_command(&mut self, command: Command, source_open: &mut bool) {
        log::debug!("command {}", command.name());
        match command {
            Command::SetDestination { destination, reply } => {
                self.controller.set_destination(destination);
                self.settle(source_open);
                let _ = reply.send(Ok(()));
            }
            Command::ClearDestination { reply } => {
                self.controller.clear_destination();
                self.settle(source_open);
                let _ = reply.send(Ok(()));
            }
            Command::Start { destination, reply } => {
                let result = self.controller.start(destination).await;
                self.settle(source_open);
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                self.controller.stop();
                self.settle(source_open);
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn on_position_event(&mut self, event: PositionEvent) {
        match event {
            PositionEvent::Fix(point) => {
                if let Some(request) = self.controller.on_position_update(point) {
                    // The newest position wins; whatever was in flight is now stale.
                    self.cancel_inflight();
                    let router = self.controller.router();
                    let tx = self.route_tx.clone();
                    self.inflight = Some(tokio::spawn(async move {
                        let response = request.execute(router.as_ref()).await;
                        let _ = tx.send(response);
                    }));
                }
            }
            PositionEvent::Error(error) => self.controller.on_position_error(error),
        }
    }

    /// Hold a session watch while tracking and a plain locate watch otherwise.
    /// Returns true if the subscription was replaced.
    fn sync_subscription(&mut self) -> bool {
        let wanted = if self.controller.is_tracking() {
            WatchOptions::session()
        } else {
            WatchOptions::locate()
        };
        if self.subscription.options() == wanted {
            return false;
        }
        if !self.controller.is_tracking() {
            self.cancel_inflight();
        }

        let next = self.source.subscribe(wanted);
        let mut previous = std::mem::replace(&mut self.subscription, next);
        let pending = previous.drain_pending();
        self.source.unsubscribe(previous);
        log::debug!(
            "switched position watch (high_accuracy={}), {} pending",
            wanted.high_accuracy,
            pending.len()
        );
        for event in pending {
            self.on_position_event(event);
        }
        true
    }

    fn settle(&mut self, source_open: &mut bool) {
        if self.sync_subscription() {
            *source_open = true;
        }
        self.publish();
    }

    fn cancel_inflight(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }

    /// Move emitted events into the log and refresh the status snapshot.
    fn publish(&mut self) {
        let mut locked = self.shared.lock().unwrap();
        while let Ok(event) = self.events.try_recv() {
            let seq = locked.status.last_event_seq + 1;
            locked.status.last_event_seq = seq;
            let record = EventRecord {
                seq,
                at: Utc::now(),
                notice: Notice::for_event(&event),
                event,
            };
            if locked.log.len() == locked.capacity {
                locked.log.pop_front();
            }
            locked.log.push_back(record.clone());
            let _ = self.fanout.send(record);
        }

        locked.status.tracking = self.controller.is_tracking();
        locked.status.position = self.controller.position();
        locked.status.destination = self.controller.destination();
        locked.status.session = self.controller.snapshot();
    }
}
