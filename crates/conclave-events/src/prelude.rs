//! Prelude module - commonly used types for convenient import.
//!
//! Use `use conclave_events::prelude::*;` to import all essential types.

// Event bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};

// Events
pub use crate::{CommentRef, ConclaveEvent, EventMetadata, IntegrationKind, MergeOutcome};

// Subscriber system
pub use crate::{EventFilter, EventSubscriber, FilterSubscriber, SubscriberId, SubscriberRegistry};
