//! Position source seam.
//!
//! A source hands out [`Subscription`]s, each a lazy, restartable sequence of
//! [`PositionEvent`]s. Dropping interest is explicit: `unsubscribe` closes the
//! sequence so no further updates leak to a stopped session.

mod channel;
mod error;

pub use channel::ChannelPositionSource;
pub use error::PositionError;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionEvent {
    Fix(Coordinate),
    Error(PositionError),
}

/// Watch parameters. Session watches ask for high accuracy and no cached fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct WatchOptions {
    #[serde(default)]
    pub high_accuracy: bool,
}

impl WatchOptions {
    pub fn locate() -> Self {
        Self {
            high_accuracy: false,
        }
    }

    pub fn session() -> Self {
        Self {
            high_accuracy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(id: u64) -> Self {
        SubscriptionId(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    options: WatchOptions,
    rx: mpsc::UnboundedReceiver<PositionEvent>,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        options: WatchOptions,
        rx: mpsc::UnboundedReceiver<PositionEvent>,
    ) -> Self {
        Self { id, options, rx }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn options(&self) -> WatchOptions {
        self.options
    }

    /// Next event, or `None` once the source has closed this subscription.
    pub async fn next(&mut self) -> Option<PositionEvent> {
        self.rx.recv().await
    }

    /// Events already delivered but not yet read.
    pub fn drain_pending(&mut self) -> Vec<PositionEvent> {
        let mut pending = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            pending.push(event);
        }
        pending
    }
}

pub trait PositionSource: Send + Sync + 'static {
    fn subscribe(&self, options: WatchOptions) -> Subscription;

    fn unsubscribe(&self, subscription: Subscription);

    /// Single-shot read of the latest known event, used for the initial permission check.
    fn current(&self) -> Option<PositionEvent>;
}
