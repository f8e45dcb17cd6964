//! Entry point for `conclaved`, the Conclave multiplayer session
//! coordination daemon.
//!
//! Wires the session store, event bus, ingestion adapters, and WebSocket
//! gateway together behind a single HTTP listener, starts each
//! integration's periodic mapping cleanup, and serves until asked to
//! shut down.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;
mod shutdown;

use std::sync::Arc;

use clap::Parser;
use conclave_events::EventBus;
use conclave_gateway::{router, AppState, GatewayConfig};
use conclave_session::SessionStore;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,conclave=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = conclave_config::Config::load(cli.config.as_deref())?;

    let gateway_config = GatewayConfig {
        bind_addr: cli.bind.unwrap_or_else(|| config.bind_addr.clone()),
        source_control: config.source_control.clone(),
        chat: config.chat.clone(),
        response: config.response.clone(),
        mapping: config.mapping,
    };

    let bus = EventBus::new();
    let sessions = Arc::new(SessionStore::new(bus.clone(), config.session.clone()));
    let state = AppState::new(&gateway_config, sessions, bus);

    state
        .pull_requests
        .mappings()
        .start_periodic_cleanup(config.mapping.idle_timeout)
        .await;
    state
        .chat
        .mappings()
        .start_periodic_cleanup(config.mapping.idle_timeout)
        .await;

    let listener = tokio::net::TcpListener::bind(&gateway_config.bind_addr).await?;
    tracing::info!(addr = %gateway_config.bind_addr, "conclaved listening");

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    tracing::info!("shutting down, stopping mapping cleanup tasks");
    state.pull_requests.mappings().stop_periodic_cleanup().await;
    state.chat.mappings().stop_periodic_cleanup().await;

    Ok(())
}
