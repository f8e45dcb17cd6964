//! Synchronous, callback-based subscribers.
//!
//! This is the second of the two subscription mechanisms the bus offers:
//! unlike [`crate::bus::EventReceiver`], a synchronous subscriber is invoked
//! in-line during [`crate::bus::EventBus::publish`], before `publish`
//! returns. That makes it suitable for cheap, synchronous bookkeeping (e.g.
//! metrics counters) but unsuitable for anything that blocks or awaits.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::ConclaveEvent;

/// Identifies a registered synchronous subscriber so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A synchronous handler invoked for every event that passes its filter.
///
/// Implementations must not block or panic-expect: a panic inside `on_event`
/// is caught by the bus and logged, but it still means this subscriber
/// missed the event.
pub trait EventSubscriber: Send + Sync {
    /// Called synchronously for each matching event.
    fn on_event(&self, event: &ConclaveEvent);
}

/// Restricts which events reach a registered subscriber.
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Matches every event.
    #[default]
    All,
    /// Matches only events scoped to one session.
    Session(conclave_core::SessionId),
    /// Matches only events whose `event_type()` is in this set.
    Types(Vec<&'static str>),
}

impl EventFilter {
    fn matches(&self, event: &ConclaveEvent) -> bool {
        match self {
            Self::All => true,
            Self::Session(session_id) => event.session_id() == Some(*session_id),
            Self::Types(types) => types.contains(&event.event_type()),
        }
    }
}

/// Wraps any closure as an [`EventSubscriber`], applying an [`EventFilter`]
/// before invoking it.
pub struct FilterSubscriber<F> {
    filter: EventFilter,
    handler: F,
}

impl<F> FilterSubscriber<F>
where
    F: Fn(&ConclaveEvent) + Send + Sync,
{
    /// Wrap `handler`, invoking it only for events matching `filter`.
    pub fn new(filter: EventFilter, handler: F) -> Self {
        Self { filter, handler }
    }
}

impl<F> EventSubscriber for FilterSubscriber<F>
where
    F: Fn(&ConclaveEvent) + Send + Sync,
{
    fn on_event(&self, event: &ConclaveEvent) {
        if self.filter.matches(event) {
            (self.handler)(event);
        }
    }
}

struct Entry {
    id: SubscriberId,
    subscriber: Arc<dyn EventSubscriber>,
}

/// Registry of synchronous subscribers notified in-line by the event bus.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    entries: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry").field("id", &self.id).finish()
    }
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber, returning an id that can later be passed to
    /// [`SubscriberRegistry::unsubscribe`].
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push(Entry { id, subscriber });
        id
    }

    /// Remove a previously registered subscriber. Returns `true` if it was
    /// present.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Notify every matching subscriber. A subscriber that panics is caught
    /// and logged so one bad handler cannot prevent delivery to the others.
    pub fn notify(&self, event: &ConclaveEvent) {
        let snapshot: Vec<Arc<dyn EventSubscriber>> = self
            .entries
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.subscriber))
            .collect();

        for subscriber in snapshot {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber.on_event(event);
            }));
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(
                    event_type = event.event_type(),
                    panic = %message,
                    "synchronous event subscriber panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMetadata;
    use conclave_core::SessionId;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn notifies_all_subscribers() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            registry.subscribe(Arc::new(FilterSubscriber::new(EventFilter::All, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })));
        }

        registry.notify(&ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        let id = registry.subscribe(Arc::new(FilterSubscriber::new(EventFilter::All, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        })));

        assert!(registry.unsubscribe(id));
        registry.notify(&ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!registry.unsubscribe(id));
    }

    #[test]
    fn session_filter_excludes_other_sessions() {
        let registry = SubscriberRegistry::new();
        let target = SessionId::new();
        let other = SessionId::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        registry.subscribe(Arc::new(FilterSubscriber::new(
            EventFilter::Session(target),
            move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
            },
        )));

        registry.notify(&ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: other,
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);

        registry.notify(&ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: target,
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn a_panicking_subscriber_does_not_block_the_others() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        registry.subscribe(Arc::new(FilterSubscriber::new(EventFilter::All, |_| {
            panic!("boom");
        })));
        let counted = Arc::clone(&count);
        registry.subscribe(Arc::new(FilterSubscriber::new(EventFilter::All, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        })));

        registry.notify(&ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
