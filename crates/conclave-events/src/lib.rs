//! Conclave Events - the typed pub/sub bus that carries every coordination
//! event between the session store, mapping stores, adapters, and gateway.
//!
//! This crate provides:
//! - The sealed [`ConclaveEvent`] enum covering every event kind
//! - A broadcast-based [`EventBus`] for async subscribers
//! - A [`SubscriberRegistry`] for synchronous, callback-based handlers
//!
//! # Architecture
//!
//! Events are published to an [`EventBus`], which delivers them two ways:
//!
//! 1. **Async receivers** — `bus.subscribe()` returns an [`EventReceiver`]
//!    polled with `.recv().await`. This is what the WebSocket gateway uses
//!    to fan events out to connected clients.
//!
//! 2. **Synchronous subscribers** — implementations of [`EventSubscriber`]
//!    registered with [`EventBus::registry`] are invoked in-line, before
//!    `publish` returns. A subscriber that panics is caught and logged so
//!    one bad handler can't block delivery to the others.
//!
//! # Example
//!
//! ```rust
//! use conclave_events::{EventBus, ConclaveEvent, EventMetadata};
//! use conclave_core::SessionId;
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(ConclaveEvent::SessionCreated {
//!     metadata: EventMetadata::now(),
//!     session_id: SessionId::new(),
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "session.created");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;
mod subscriber;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{CommentRef, ConclaveEvent, EventMetadata, IntegrationKind, MergeOutcome};
pub use subscriber::{
    EventFilter, EventSubscriber, FilterSubscriber, SubscriberId, SubscriberRegistry,
};
