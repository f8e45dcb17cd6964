//! Ingestion adapters: translate external webhook events into Conclave
//! events, maintaining one [`conclave_mapping::MappingStore`] per
//! integration, plus outbound response posting.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod chat;
mod config;
mod error;
mod pull_request;
mod response;
mod signature;
mod types;

pub use chat::ChatAdapter;
pub use config::{IntegrationConfig, ResponseConfig};
pub use error::{AdapterError, AdapterResult};
pub use pull_request::PullRequestAdapter;
pub use response::{format_body, should_reply_inline, ResponsePoster};
pub use signature::verify_signature;
pub use types::{ChatExtra, ChatKey, CommentContext, HandleOutcome, PrExtra, PrKey, ThreadStatus};
