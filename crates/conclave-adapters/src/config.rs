//! Adapter configuration.

use serde::{Deserialize, Serialize};

/// Shared ingestion settings for one integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// HMAC secret for inbound signature verification. Empty disables
    /// verification.
    pub webhook_secret: String,
    /// Events authored by this username are silently ignored.
    pub bot_username: Option<String>,
    /// Whether `pull_request: opened` / new threads auto-create a session.
    pub auto_create_sessions: bool,
}

/// Templates and limits for outbound response posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Prepended to every posted response.
    pub header_template: String,
    /// Appended after the body, if set.
    pub footer_template: Option<String>,
    /// Whether to include a commit-sha reference line.
    pub include_commit_sha: bool,
    /// Truncate the final body to this many characters, appending a marker.
    pub max_length: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            header_template: String::new(),
            footer_template: None,
            include_commit_sha: false,
            max_length: 4000,
        }
    }
}
