//! Event bus for broadcasting events to subscribers.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::ConclaveEvent;
use crate::subscriber::SubscriberRegistry;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus for broadcasting events to all subscribers.
///
/// The event bus uses a broadcast channel to deliver events to all
/// connected receivers. Events are delivered asynchronously and in order.
/// A second, synchronous registry is notified in-line during `publish`, for
/// subscribers that need immediate callback-based delivery.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<ConclaveEvent>>,
    registry: Arc<SubscriberRegistry>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            registry: Arc::new(SubscriberRegistry::new()),
            capacity,
        }
    }

    /// Publish an event to all subscribers.
    ///
    /// Synchronous subscribers are notified first (panics caught and
    /// logged, per subscriber), then the event is broadcast to async
    /// receivers. Returns the number of async receivers that received it.
    pub fn publish(&self, event: ConclaveEvent) -> usize {
        let event = Arc::new(event);

        trace!(event_type = %event.event_type(), "publishing event");

        self.registry.notify(&event);

        match self.sender.send(Arc::clone(&event)) {
            Ok(count) => {
                debug!(
                    event_type = %event.event_type(),
                    receiver_count = count,
                    "event published"
                );
                count
            }
            Err(_) => {
                trace!(event_type = %event.event_type(), "no async receivers for event");
                0
            }
        }
    }

    /// Subscribe asynchronously; returns a receiver polled with `recv()`.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// The synchronous subscriber registry, shared across clones of this bus.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Current number of active async subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    /// Clones share the same broadcast sender *and* the same synchronous
    /// registry, so subscribing once and cloning the bus to hand out to
    /// multiple components still delivers to one shared set of listeners.
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            registry: Arc::clone(&self.registry),
            capacity: self.capacity,
        }
    }
}

/// Receiver for events from the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<ConclaveEvent>>,
}

impl EventReceiver {
    /// Receive the next event, transparently skipping past a `Lagged` error
    /// (logging how many events were dropped). Returns `None` once the bus
    /// is gone and no more events will ever arrive.
    pub async fn recv(&mut self) -> Option<Arc<ConclaveEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "event receiver lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`EventReceiver::recv`].
    pub fn try_recv(&mut self) -> Option<Arc<ConclaveEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "event receiver lagged, events dropped");
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMetadata;
    use conclave_core::SessionId;

    fn sample_event() -> ConclaveEvent {
        ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
        }
    }

    #[tokio::test]
    async fn event_bus_creation_has_default_capacity() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let count = bus.publish(sample_event());
        assert_eq!(count, 1);

        let msg = receiver.recv().await.unwrap();
        assert_eq!(msg.event_type(), "session.created");
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let mut r1 = bus.subscribe();
        let mut r2 = bus.subscribe();

        let count = bus.publish(sample_event());
        assert_eq!(count, 2);

        assert_eq!(r1.recv().await.unwrap().event_type(), "session.created");
        assert_eq!(r2.recv().await.unwrap().event_type(), "session.created");
    }

    #[tokio::test]
    async fn no_subscribers_returns_zero() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(sample_event()), 0);
    }

    #[tokio::test]
    async fn try_recv_empty_is_none() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        assert!(receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn cloned_bus_shares_the_same_registry() {
        use crate::subscriber::{EventFilter, FilterSubscriber};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc as StdArc;

        let bus = EventBus::new();
        let cloned = bus.clone();
        let count = StdArc::new(AtomicUsize::new(0));
        let counted = StdArc::clone(&count);
        bus.registry().subscribe(StdArc::new(FilterSubscriber::new(
            EventFilter::All,
            move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
            },
        )));

        cloned.publish(sample_event());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscriber_count_tracks_active_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        let r1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        let _r2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(r1);
    }
}
