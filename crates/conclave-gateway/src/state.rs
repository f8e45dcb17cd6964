//! Shared application state handed to every axum handler.

use std::sync::Arc;

use conclave_adapters::{ChatAdapter, PullRequestAdapter, ResponseConfig, ResponsePoster};
use conclave_events::EventBus;
use conclave_session::SessionStore;

use crate::config::GatewayConfig;

/// Everything a handler needs: the session store (and, transitively, the
/// event bus it publishes to), the two ingestion adapters, and the
/// outbound response poster.
#[derive(Clone)]
pub struct AppState {
    /// Session CRUD, membership, locking, and the embedded prompt queue.
    pub sessions: Arc<SessionStore>,
    /// The event bus the WebSocket gateway subscribes to.
    pub bus: EventBus,
    /// Pull-request webhook ingestion.
    pub pull_requests: Arc<PullRequestAdapter>,
    /// Chat-platform webhook ingestion.
    pub chat: Arc<ChatAdapter>,
    /// Outbound response formatting.
    pub response: ResponseConfig,
    /// Outbound response poster.
    pub poster: ResponsePoster,
    /// HMAC secret for `POST /webhook/<source-control>` signature
    /// verification. Duplicated from the source-control
    /// [`conclave_adapters::IntegrationConfig`] since the adapter itself
    /// doesn't expose it — signature checking happens at the HTTP edge,
    /// before the payload ever reaches the adapter.
    pub source_control_secret: String,
}

impl AppState {
    /// Assemble application state from a gateway config and a freshly
    /// created session store / event bus pair.
    #[must_use]
    pub fn new(config: &GatewayConfig, sessions: Arc<SessionStore>, bus: EventBus) -> Self {
        let pull_requests = Arc::new(PullRequestAdapter::new(
            config.source_control.clone(),
            config.mapping,
            Arc::clone(&sessions),
        ));
        let chat = Arc::new(ChatAdapter::new(
            config.chat.clone(),
            config.mapping,
            Arc::clone(&sessions),
        ));
        Self {
            sessions,
            bus,
            pull_requests,
            chat,
            response: config.response.clone(),
            poster: ResponsePoster::new(reqwest::Client::new()),
            source_control_secret: config.source_control.webhook_secret.clone(),
        }
    }
}
