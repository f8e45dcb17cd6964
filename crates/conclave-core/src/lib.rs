//! Shared identifiers, error taxonomy, and small utilities used across every
//! Conclave crate.
//!
//! This crate has **no dependencies on other internal Conclave crates** —
//! it only depends on `serde`, `chrono`, `uuid`, and `thiserror`. Every
//! other crate in the workspace depends on this one.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ids;
pub mod model;
pub mod retry;

pub use error::{ConclaveError, ConclaveResult};
pub use ids::{ClientId, PromptId, SessionId, SubscriberId, UserId};
pub use model::{
    AgentStatus, Client, ClientType, Cursor, GitSyncStatus, Priority, Prompt, SessionState, User,
    COLOR_PALETTE,
};
