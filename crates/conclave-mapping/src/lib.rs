//! Generic external-integration mapping store.
//!
//! Instantiated once per integration (pull requests, chat threads) via
//! [`MappingStore<K, E>`], where `K` is the integration's external key type
//! and `E` is its integration-specific extra data. A companion
//! [`ContextTable`] holds auxiliary records (e.g. comment contexts) keyed by
//! their own id but tagged with the owning external key for mass-deletion.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod context;
mod error;
mod key;
mod mapping;
mod store;

pub use config::MappingConfig;
pub use context::ContextTable;
pub use error::{MappingError, MappingResult};
pub use key::{ExternalKey, MappingExtra};
pub use mapping::Mapping;
pub use store::MappingStore;
