//! Gateway-level configuration: where to bind, and the integrations wired
//! into the webhook receivers.

use conclave_adapters::{IntegrationConfig, ResponseConfig};
use conclave_mapping::MappingConfig;
use serde::{Deserialize, Serialize};

/// Top-level gateway configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,
    /// Source-control ingestion settings.
    pub source_control: IntegrationConfig,
    /// Chat-platform ingestion settings.
    pub chat: IntegrationConfig,
    /// Outbound response formatting.
    pub response: ResponseConfig,
    /// Capacity/idle-eviction limits shared by both integrations' mapping
    /// stores.
    pub mapping: MappingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            source_control: IntegrationConfig::default(),
            chat: IntegrationConfig::default(),
            response: ResponseConfig::default(),
            mapping: MappingConfig::default(),
        }
    }
}
