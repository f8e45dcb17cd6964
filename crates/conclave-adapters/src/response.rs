//! Outbound response posting: format a reply from templates, truncate to a
//! limit, then post it either as a reply to an inline review comment or as
//! a top-level issue comment, retrying transient failures.

use conclave_core::retry::Backoff;
use tracing::warn;

use crate::config::ResponseConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::types::CommentContext;

const TRUNCATION_MARKER: &str = "\n… (truncated)";

/// Render a response body from the configured templates, truncating to
/// `max_length` with a trailing marker if needed.
#[must_use]
pub fn format_body(config: &ResponseConfig, summary: &str, commit_sha: Option<&str>) -> String {
    let mut body = String::new();
    if !config.header_template.is_empty() {
        body.push_str(&config.header_template);
        body.push('\n');
    }
    body.push_str(summary);
    if config.include_commit_sha {
        if let Some(sha) = commit_sha {
            body.push_str(&format!("\n\ncommit: {sha}"));
        }
    }
    if let Some(footer) = &config.footer_template {
        body.push('\n');
        body.push_str(footer);
    }

    if body.chars().count() > config.max_length {
        let keep = config.max_length.saturating_sub(TRUNCATION_MARKER.chars().count());
        let truncated: String = body.chars().take(keep).collect();
        body = format!("{truncated}{TRUNCATION_MARKER}");
    }
    body
}

/// Decide whether a response should be posted as an inline reply (requires
/// `as_reply` and a stored context with a `path`) or as a top-level comment.
#[must_use]
pub fn should_reply_inline(as_reply: bool, context: Option<&CommentContext>) -> bool {
    as_reply && context.is_some_and(|c| c.path.is_some())
}

/// Posts formatted responses back to an external platform over HTTP, with
/// bounded retry on transient failures.
#[derive(Debug, Clone)]
pub struct ResponsePoster {
    client: reqwest::Client,
}

impl ResponsePoster {
    /// Create a poster using the given HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST `body` as JSON to `url`, retrying per [`Backoff::default_for_webhooks`]
    /// on request-level failures (network errors, 5xx). A 4xx response is
    /// treated as non-retryable and surfaced immediately.
    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> AdapterResult<()> {
        let mut backoff = Backoff::default_for_webhooks();
        loop {
            match self.client.post(url).json(body).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if response.status().is_client_error() => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AdapterError::PlatformRejected { status, body });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    match backoff.next_delay() {
                        Some(delay) => {
                            warn!(status, attempt = backoff.attempts_made(), "retrying response post");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(AdapterError::PlatformRejected { status, body }),
                    }
                }
                Err(err) => match backoff.next_delay() {
                    Some(delay) => {
                        warn!(error = %err, attempt = backoff.attempts_made(), "retrying response post");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(AdapterError::RequestFailed(err)),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_body_truncates_with_a_marker() {
        let config = ResponseConfig {
            header_template: String::new(),
            footer_template: None,
            include_commit_sha: false,
            max_length: 20,
        };
        let body = format_body(&config, &"x".repeat(100), None);
        assert!(body.len() <= 20 + TRUNCATION_MARKER.len());
        assert!(body.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn format_body_includes_header_and_footer() {
        let config = ResponseConfig {
            header_template: "## Summary".to_string(),
            footer_template: Some("-- conclave".to_string()),
            include_commit_sha: false,
            max_length: 4000,
        };
        let body = format_body(&config, "did the thing", None);
        assert!(body.starts_with("## Summary"));
        assert!(body.ends_with("-- conclave"));
    }

    #[test]
    fn should_reply_inline_requires_a_path_and_as_reply() {
        let with_path = CommentContext {
            path: Some("src/lib.rs".to_string()),
            line: Some(10),
        };
        assert!(should_reply_inline(true, Some(&with_path)));
        assert!(!should_reply_inline(false, Some(&with_path)));
        assert!(!should_reply_inline(true, Some(&CommentContext::default())));
        assert!(!should_reply_inline(true, None));
    }
}
