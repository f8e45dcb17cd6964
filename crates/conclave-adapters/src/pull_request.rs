//! Source-control pull-request ingestion adapter.

use std::sync::Arc;

use conclave_events::{CommentRef, ConclaveEvent, EventMetadata};
use conclave_mapping::{ContextTable, MappingConfig, MappingStore};
use conclave_session::SessionStore;
use serde_json::Value;
use tracing::trace;

use crate::config::IntegrationConfig;
use crate::types::{CommentContext, HandleOutcome, PrExtra, PrKey};

fn as_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

fn as_u64(value: &Value, path: &[&str]) -> Option<u64> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_u64()
}

fn as_bool(value: &Value, path: &[&str]) -> Option<bool> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_bool()
}

/// Translates GitHub-shaped pull-request webhook payloads into Conclave
/// events, maintaining the PR-to-session mapping and comment contexts.
pub struct PullRequestAdapter {
    mappings: MappingStore<PrKey, PrExtra>,
    comments: ContextTable<PrKey, String, CommentContext>,
    config: IntegrationConfig,
    sessions: Arc<SessionStore>,
}

impl PullRequestAdapter {
    /// Create a new adapter bound to a session store.
    #[must_use]
    pub fn new(config: IntegrationConfig, mapping_config: MappingConfig, sessions: Arc<SessionStore>) -> Self {
        Self {
            mappings: MappingStore::new(mapping_config),
            comments: ContextTable::new(),
            config,
            sessions,
        }
    }

    /// The underlying mapping store, for direct queries (`for_scope`,
    /// `count`, periodic cleanup, etc).
    #[must_use]
    pub fn mappings(&self) -> &MappingStore<PrKey, PrExtra> {
        &self.mappings
    }

    fn is_from_bot(&self, payload: &Value) -> bool {
        match (&self.config.bot_username, as_str(payload, &["sender", "login"])) {
            (Some(bot), Some(login)) => bot == login,
            _ => false,
        }
    }

    fn pr_key(&self, payload: &Value) -> Option<PrKey> {
        Some(PrKey {
            repo: as_str(payload, &["repository", "full_name"])?.to_string(),
            pr_number: as_u64(payload, &["pull_request", "number"])
                .or_else(|| as_u64(payload, &["issue", "number"]))?,
        })
    }

    /// Translate one webhook delivery into an event, performing whatever
    /// mapping-store bookkeeping the event implies. Never errors — an
    /// unrecognized event comes back as `handled: false` with an
    /// explanatory message.
    pub async fn handle(&self, event_type: &str, payload: &Value) -> HandleOutcome {
        if self.is_from_bot(payload) {
            trace!("ignoring pull request event authored by the configured bot account");
            return HandleOutcome::ignored();
        }

        match event_type {
            "ping" => HandleOutcome::ignored(),
            "pull_request" => self.handle_pull_request(payload).await,
            "pull_request_review_comment" => self.handle_review_comment(payload),
            "issue_comment" => self.handle_issue_comment(payload),
            "pull_request_review" => self.handle_review(payload),
            other => HandleOutcome::unhandled(format!("unrecognized event type: {other}")),
        }
    }

    async fn handle_pull_request(&self, payload: &Value) -> HandleOutcome {
        let Some(key) = self.pr_key(payload) else {
            return HandleOutcome::unhandled("missing repository or pull_request.number");
        };
        let Some(action) = as_str(payload, &["action"]) else {
            return HandleOutcome::unhandled("missing action");
        };

        match action {
            "opened" | "reopened" => {
                let session_id = if self.config.auto_create_sessions {
                    let external_id = format!("{}#{}", key.repo, key.pr_number);
                    let session = self.sessions.create(external_id).await;
                    self.mappings.create_or_get(key.clone(), session.id);
                    Some(session.id)
                } else {
                    self.mappings.get(&key).map(|m| m.session_id)
                };
                HandleOutcome::ok(ConclaveEvent::PrOpened {
                    metadata: EventMetadata::now(),
                    repo: key.repo,
                    pr_number: key.pr_number,
                    session_id,
                })
            }
            "edited" | "synchronize" | "ready_for_review" | "labeled" | "unlabeled" => {
                let session_id = self.mappings.get(&key).map(|m| m.session_id);
                if session_id.is_some() {
                    let _ = self.mappings.touch(&key);
                }
                HandleOutcome::ok(ConclaveEvent::PrUpdated {
                    metadata: EventMetadata::now(),
                    repo: key.repo,
                    pr_number: key.pr_number,
                    session_id,
                })
            }
            "closed" => {
                let session_id = self.mappings.get(&key).map(|m| m.session_id);
                let merged = as_bool(payload, &["pull_request", "merged"]).unwrap_or(false);
                if merged {
                    HandleOutcome::ok(ConclaveEvent::PrMerged {
                        metadata: EventMetadata::now(),
                        repo: key.repo,
                        pr_number: key.pr_number,
                        session_id,
                    })
                } else {
                    HandleOutcome::ok(ConclaveEvent::PrClosed {
                        metadata: EventMetadata::now(),
                        repo: key.repo,
                        pr_number: key.pr_number,
                        session_id,
                    })
                }
            }
            other => HandleOutcome::unhandled(format!("unrecognized pull_request action: {other}")),
        }
    }

    fn handle_review_comment(&self, payload: &Value) -> HandleOutcome {
        let Some(key) = self.pr_key(payload) else {
            return HandleOutcome::unhandled("missing repository or pull_request.number");
        };
        let Some(action) = as_str(payload, &["action"]) else {
            return HandleOutcome::unhandled("missing action");
        };
        let Some(comment_id) = as_u64(payload, &["comment", "id"]) else {
            return HandleOutcome::unhandled("missing comment.id");
        };
        let comment_id = comment_id.to_string();

        match action {
            "created" => {
                let context = CommentContext {
                    path: as_str(payload, &["comment", "path"]).map(str::to_string),
                    line: as_u64(payload, &["comment", "line"]).map(|l| l as u32),
                };
                self.comments.insert(comment_id.clone(), key.clone(), context.clone());
                let _ = self.mappings.touch(&key);
                HandleOutcome::ok(ConclaveEvent::CommentCreated {
                    metadata: EventMetadata::now(),
                    repo: key.repo,
                    pr_number: key.pr_number,
                    comment: CommentRef {
                        comment_id,
                        path: context.path,
                        line: context.line,
                    },
                })
            }
            "edited" => {
                let context = self.comments.get(&comment_id).unwrap_or_default();
                HandleOutcome::ok(ConclaveEvent::CommentUpdated {
                    metadata: EventMetadata::now(),
                    repo: key.repo,
                    pr_number: key.pr_number,
                    comment: CommentRef {
                        comment_id,
                        path: context.path,
                        line: context.line,
                    },
                })
            }
            other => HandleOutcome::unhandled(format!(
                "unrecognized pull_request_review_comment action: {other}"
            )),
        }
    }

    fn handle_issue_comment(&self, payload: &Value) -> HandleOutcome {
        if payload.get("issue").and_then(|i| i.get("pull_request")).is_none() {
            return HandleOutcome::ignored();
        }
        let Some(key) = self.pr_key(payload) else {
            return HandleOutcome::unhandled("missing repository or issue.number");
        };
        if as_str(payload, &["action"]) != Some("created") {
            return HandleOutcome::unhandled("unrecognized issue_comment action");
        }
        let comment_id = as_u64(payload, &["comment", "id"])
            .map(|id| id.to_string())
            .unwrap_or_default();
        self.comments.insert(comment_id.clone(), key.clone(), CommentContext::default());
        let _ = self.mappings.touch(&key);
        HandleOutcome::ok(ConclaveEvent::CommentCreated {
            metadata: EventMetadata::now(),
            repo: key.repo,
            pr_number: key.pr_number,
            comment: CommentRef {
                comment_id,
                path: None,
                line: None,
            },
        })
    }

    fn handle_review(&self, payload: &Value) -> HandleOutcome {
        let Some(key) = self.pr_key(payload) else {
            return HandleOutcome::unhandled("missing repository or pull_request.number");
        };
        if as_str(payload, &["action"]) != Some("submitted") {
            return HandleOutcome::unhandled("unrecognized pull_request_review action");
        }
        let Some(state) = as_str(payload, &["review", "state"]) else {
            return HandleOutcome::unhandled("missing review.state");
        };
        let _ = self.mappings.touch(&key);
        HandleOutcome::ok(ConclaveEvent::ReviewSubmitted {
            metadata: EventMetadata::now(),
            repo: key.repo,
            pr_number: key.pr_number,
            state: state.to_string(),
        })
    }
}

impl std::fmt::Debug for PullRequestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullRequestAdapter")
            .field("mappings_count", &self.mappings.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_events::EventBus;
    use serde_json::json;

    fn adapter() -> PullRequestAdapter {
        let sessions = Arc::new(SessionStore::new(
            EventBus::new(),
            conclave_session::SessionStoreConfig::default(),
        ));
        PullRequestAdapter::new(
            IntegrationConfig {
                auto_create_sessions: true,
                ..Default::default()
            },
            MappingConfig::default(),
            sessions,
        )
    }

    #[tokio::test]
    async fn opened_creates_a_mapping_when_auto_create_is_on() {
        let adapter = adapter();
        let payload = json!({
            "action": "opened",
            "repository": {"full_name": "acme/widget"},
            "pull_request": {"number": 7, "merged": false},
        });
        let outcome = adapter.handle("pull_request", &payload).await;
        assert!(outcome.handled);
        match outcome.event.unwrap() {
            ConclaveEvent::PrOpened { session_id, .. } => assert!(session_id.is_some()),
            other => panic!("expected PrOpened, got {other:?}"),
        }
        assert_eq!(adapter.mappings().count(), 1);
    }

    #[tokio::test]
    async fn closed_merged_emits_pr_merged_not_pr_closed() {
        let adapter = adapter();
        let payload = json!({
            "action": "closed",
            "repository": {"full_name": "acme/widget"},
            "pull_request": {"number": 7, "merged": true},
        });
        let outcome = adapter.handle("pull_request", &payload).await;
        assert!(matches!(outcome.event.unwrap(), ConclaveEvent::PrMerged { .. }));
    }

    #[tokio::test]
    async fn events_from_the_configured_bot_are_silently_ignored() {
        let mut adapter = adapter();
        adapter.config.bot_username = Some("conclave-bot".to_string());
        let payload = json!({
            "action": "opened",
            "repository": {"full_name": "acme/widget"},
            "pull_request": {"number": 7},
            "sender": {"login": "conclave-bot"},
        });
        let outcome = adapter.handle("pull_request", &payload).await;
        assert!(outcome.handled);
        assert!(outcome.event.is_none());
    }

    #[tokio::test]
    async fn issue_comment_on_a_non_pr_issue_is_ignored() {
        let adapter = adapter();
        let payload = json!({
            "action": "created",
            "repository": {"full_name": "acme/widget"},
            "issue": {"number": 7},
        });
        let outcome = adapter.handle("issue_comment", &payload).await;
        assert!(outcome.handled);
        assert!(outcome.event.is_none());
    }

    #[tokio::test]
    async fn unrecognized_event_type_is_unhandled() {
        let adapter = adapter();
        let outcome = adapter.handle("deployment_status", &json!({})).await;
        assert!(!outcome.handled);
        assert!(outcome.error.is_some());
    }
}
