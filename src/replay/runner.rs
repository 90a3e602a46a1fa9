use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::trace::{Action, Trace};
use crate::navigation::{EventRecord, NavError, NavigationConfig, Navigator, TrackerEvent};
use crate::position::{ChannelPositionSource, PositionEvent};
use crate::routing::{DirectRouter, RoutingConfig};

/// Time given to re-anchors still in flight after the last step.
const SETTLE: Duration = Duration::from_millis(200);

/// Feeds a [`Trace`] through a live [`Navigator`], printing every event as it is
/// recorded.
pub struct Runner {
    pub trace: Trace,
    pub navigation: NavigationConfig,
    pub routing: RoutingConfig,
    pub quiet: bool,
}

#[derive(Debug)]
pub struct ReplayReport {
    pub steps: usize,
    /// Commands the navigator refused, by step index.
    pub rejected: Vec<(usize, NavError)>,
    pub events: Vec<EventRecord>,
}

impl Runner {
    pub fn new(trace: Trace, navigation: NavigationConfig, routing: RoutingConfig) -> Self {
        Self {
            trace,
            navigation,
            routing,
            quiet: false,
        }
    }

    pub async fn run(self) -> ReplayReport {
        let source = Arc::new(ChannelPositionSource::new());
        let router = Arc::new(DirectRouter::new(self.routing));
        let mut navigator = Navigator::spawn(router, source.clone(), self.navigation);

        let printer = (!self.quiet)
            .then(|| tokio::spawn(print_events(navigator.subscribe_events())));

        let start = Utc::now();
        let mut rejected = Vec::new();
        for (i, step) in self.trace.steps.iter().enumerate() {
            if let Some(time) = &step.time {
                let wait = time.resolve(start) - Utc::now();
                if let Ok(wait) = wait.to_std() {
                    tokio::time::sleep(wait).await;
                }
            }
            log::debug!("step {}: {}", i, step.action.name());

            let result = match &step.action {
                Action::Position(point) => {
                    source.publish(PositionEvent::Fix(*point));
                    Ok(())
                }
                Action::PositionError(error) => {
                    source.publish(PositionEvent::Error(*error));
                    Ok(())
                }
                Action::Destination(point) => navigator.set_destination(*point).await,
                Action::ClearDestination => navigator.clear_destination().await,
                Action::Start(destination) => navigator.start(*destination).await.map(|_| ()),
                Action::Stop => navigator.stop().await,
            };
            if let Err(e) = result {
                log::warn!("step {} ({}) rejected: {}", i, step.action.name(), e);
                rejected.push((i, e));
            }
        }

        tokio::time::sleep(SETTLE).await;
        let events = navigator.events_since(0);
        navigator.shutdown().await;
        drop(navigator);
        if let Some(printer) = printer {
            let _ = printer.await;
        }

        ReplayReport {
            steps: self.trace.steps.len(),
            rejected,
            events,
        }
    }
}

async fn print_events(mut rx: broadcast::Receiver<EventRecord>) {
    loop {
        match rx.recv().await {
            Ok(record) => {
                let text = record
                    .notice
                    .as_ref()
                    .map(|n| n.message.clone())
                    .or_else(|| match &record.event {
                        TrackerEvent::PositionUpdated { position } => {
                            Some(position.coordinate.to_string())
                        }
                        _ => None,
                    })
                    .unwrap_or_default();
                println!(
                    "{:>4} {} {:<20} {}",
                    record.seq,
                    record.at.format("%H:%M:%S%.3f"),
                    record.event.name(),
                    text
                );
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("event printer lagged, {} events skipped", n)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
