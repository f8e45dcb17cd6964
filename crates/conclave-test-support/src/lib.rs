//! Shared test fixtures and invariant checks for Conclave, used as a
//! dev-dependency by every other crate in the workspace.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! conclave-test-support.workspace = true
//! ```
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn join_keeps_invariants() {
//!     let fixture = SessionStoreFixture::new()
//!         .with_session("ext-1")
//!         .await
//!         .with_user("alice")
//!         .await;
//!     let session = fixture.store.get(fixture.session_id()).await.unwrap();
//!     check_invariants(&session, &SessionStoreConfig::default());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod fixtures;
mod invariants;

pub use fixtures::SessionStoreFixture;
pub use invariants::check_invariants;
