//! WebSocket gateway and HTTP control surface for multiplayer agent
//! sessions.
//!
//! Each live connection is registered against a session, receives an
//! initial snapshot, and then rides the event bus: every event published
//! for that session is forwarded as a JSON frame in publish order, and a
//! small set of inbound frames (cursor updates, lock acquire/release,
//! ping) are dispatched back into the session store. The HTTP surface
//! covers everything a socket isn't suited to — session CRUD, membership,
//! the embedded prompt queue — plus the inbound webhook receivers that
//! translate source-control and chat-platform events into session
//! mutations.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod control;
mod error;
mod frames;
mod health;
mod router;
mod state;
mod view;
mod webhook;
mod ws;

pub use config::GatewayConfig;
pub use error::{ApiError, ApiResult};
pub use frames::{event_frame, ClientFrame, ServerFrame};
pub use router::router;
pub use state::AppState;
pub use view::SessionView;
