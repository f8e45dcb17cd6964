//! The mapping value type.

use chrono::{DateTime, Utc};
use conclave_core::SessionId;

use crate::key::{ExternalKey, MappingExtra};

/// One `externalKey → session` mapping, with integration-specific `extra`
/// data (e.g. comment contexts, thread status).
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping<K, E> {
    /// The external-integration key.
    pub external_key: K,
    /// The session this external scope is mapped to.
    pub session_id: SessionId,
    /// When this mapping was first created.
    pub created_at: DateTime<Utc>,
    /// Last time any event touched this mapping.
    pub last_activity_at: DateTime<Utc>,
    /// Integration-specific extra data.
    pub extra: E,
}

impl<K: ExternalKey, E: MappingExtra> Mapping<K, E> {
    pub(crate) fn new(external_key: K, session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            external_key,
            session_id,
            created_at: now,
            last_activity_at: now,
            extra: E::default(),
        }
    }
}
