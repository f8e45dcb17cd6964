//! Configuration struct definitions.
//!
//! Each section reuses the config type the crate that actually consumes it
//! already defines (`SessionStoreConfig`, `IntegrationConfig`,
//! `ResponseConfig`) rather than duplicating their fields here — this
//! composes the owning crates' `serde(default)` structs instead of
//! re-declaring a parallel shape that could drift out of sync with them.

use conclave_adapters::{IntegrationConfig, ResponseConfig};
use conclave_mapping::MappingConfig;
use conclave_session::SessionStoreConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the Conclave daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,
    /// Session-store capacity limits and conflict-resolution defaults.
    pub session: SessionStoreConfig,
    /// Source-control webhook ingestion settings.
    pub source_control: IntegrationConfig,
    /// Chat-platform webhook ingestion settings.
    pub chat: IntegrationConfig,
    /// Capacity/idle-eviction limits shared by both integrations' mapping
    /// stores.
    pub mapping: MappingConfig,
    /// Outbound response formatting.
    pub response: ResponseConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session: SessionStoreConfig::default(),
            source_control: IntegrationConfig::default(),
            chat: IntegrationConfig::default(),
            mapping: MappingConfig::default(),
            response: ResponseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging level and output format for `tracing-subscriber`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    /// One of `pretty`, `compact`, `json`, `full`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}
