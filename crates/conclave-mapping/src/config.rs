//! Mapping-store tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capacity and idle-eviction limits for one [`crate::MappingStore`]
/// instance. Each integration (PR, chat) gets its own config instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Maximum live mappings before capacity eviction kicks in.
    pub max_mappings: usize,
    /// How long a mapping may sit untouched before `cleanup_stale` removes
    /// it (subject to [`crate::MappingExtra::protected_from_idle_eviction`]).
    #[serde(with = "humantime_seconds")]
    pub idle_timeout: Duration,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_mappings: 10_000,
            idle_timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

mod humantime_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
