use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use tokio::sync::mpsc;

use super::{PositionEvent, PositionSource, Subscription, SubscriptionId, WatchOptions};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    subscribers: HashMap<SubscriptionId, mpsc::UnboundedSender<PositionEvent>>,
    last: Option<PositionEvent>,
}

/// Push-fed position source. Whatever reports device positions (the HTTP API, a
/// replayed trace) calls [`ChannelPositionSource::publish`]; every live subscription
/// receives the event. Subscriptions only see events published after they were
/// opened; the latest one stays readable through `current()`.
#[derive(Debug, Default)]
pub struct ChannelPositionSource {
    inner: StdMutex<Inner>,
}

impl ChannelPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fan `event` out to all subscribers. Returns how many received it.
    pub fn publish(&self, event: PositionEvent) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.last = Some(event);
        inner.subscribers.retain(|_, tx| tx.send(event).is_ok());
        inner.subscribers.len()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

impl PositionSource for ChannelPositionSource {
    fn subscribe(&self, options: WatchOptions) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        let id = SubscriptionId::new(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.insert(id, tx);
        log::debug!(
            "position subscription {} opened (high_accuracy={})",
            id.id(),
            options.high_accuracy
        );

        Subscription::new(id, options, rx)
    }

    fn unsubscribe(&self, subscription: Subscription) {
        let mut inner = self.inner.lock().unwrap();
        if inner.subscribers.remove(&subscription.id()).is_some() {
            log::debug!("position subscription {} closed", subscription.id().id());
        }
    }

    fn current(&self) -> Option<PositionEvent> {
        self.inner.lock().unwrap().last
    }
}
