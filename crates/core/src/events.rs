//! Broadcast hub handing out owned subscription handles.
//!
//! Components that want notifications hold an [`EventSubscription`]; the
//! registration is released when the handle is dropped, so there is no
//! listener left behind after teardown.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

/// Notifications emitted by the catalog loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEvent {
    /// The unit set changed; cached views should be rebuilt.
    Reloaded,
}

/// Fan-out channel for a single event type.
#[derive(Debug, Clone)]
pub struct EventHub<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventHub<T> {
    /// Create a hub buffering up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> EventSubscription<T> {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Deliver an event to all live subscribers, returning how many there
    /// were. Zero subscribers is not an error.
    pub fn emit(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl<T: Clone> Default for EventHub<T> {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Owned subscription. Dropping it releases the registration.
#[derive(Debug)]
pub struct EventSubscription<T> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> EventSubscription<T> {
    /// Await the next event. Returns `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event subscription lagged, resuming");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for synchronous loops. Returns `None` when no
    /// event is pending (or the hub is gone).
    pub fn try_next(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "event subscription lagged, resuming");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_to_live_subscribers() {
        let hub = EventHub::new(4);
        let mut subscription = hub.subscribe();
        assert_eq!(hub.emit(CatalogEvent::Reloaded), 1);
        assert_eq!(subscription.try_next(), Some(CatalogEvent::Reloaded));
        assert_eq!(subscription.try_next(), None);
    }

    #[test]
    fn dropping_subscription_releases_registration() {
        let hub = EventHub::new(4);
        let subscription = hub.subscribe();
        drop(subscription);
        assert_eq!(hub.emit(CatalogEvent::Reloaded), 0);
    }

    #[tokio::test]
    async fn next_yields_pending_event() {
        let hub = EventHub::new(4);
        let mut subscription = hub.subscribe();
        hub.emit(CatalogEvent::Reloaded);
        assert_eq!(subscription.next().await, Some(CatalogEvent::Reloaded));
    }
}
