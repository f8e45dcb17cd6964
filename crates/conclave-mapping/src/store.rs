//! The generic mapping store, instantiated once per external integration.

use std::sync::Arc;

use chrono::Utc;
use conclave_core::SessionId;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::MappingConfig;
use crate::error::{MappingError, MappingResult};
use crate::key::{ExternalKey, MappingExtra};
use crate::mapping::Mapping;

/// Map `externalKey → mapping`, bounded by `max_mappings`, idle-evicted
/// after `idle_timeout`.
pub struct MappingStore<K, E> {
    entries: Arc<DashMap<K, Mapping<K, E>>>,
    by_session: Arc<DashMap<SessionId, K>>,
    config: MappingConfig,
    cleanup_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<K, E> Clone for MappingStore<K, E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            by_session: Arc::clone(&self.by_session),
            config: self.config,
            cleanup_task: Arc::clone(&self.cleanup_task),
        }
    }
}

impl<K, E> MappingStore<K, E>
where
    K: ExternalKey,
    E: MappingExtra,
{
    /// Create an empty store with the given config.
    #[must_use]
    pub fn new(config: MappingConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            by_session: Arc::new(DashMap::new()),
            config,
            cleanup_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mapping for `key` if none exists, otherwise touch and
    /// return the existing one. Frees capacity via [`Self::cleanup_oldest`]
    /// first if creating a new entry would exceed `max_mappings`.
    pub fn create_or_get(&self, key: K, session_id: SessionId) -> Mapping<K, E> {
        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry.last_activity_at = Utc::now();
            return entry.clone();
        }
        if self.entries.len() >= self.config.max_mappings {
            self.cleanup_oldest();
        }
        let mapping = Mapping::new(key.clone(), session_id);
        self.by_session.insert(session_id, key.clone());
        self.entries.insert(key, mapping.clone());
        mapping
    }

    /// Look up a mapping by its external key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Mapping<K, E>> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    /// Look up a mapping by the session it points to.
    #[must_use]
    pub fn get_by_session(&self, session_id: SessionId) -> Option<Mapping<K, E>> {
        let key = self.by_session.get(&session_id)?;
        self.get(&key)
    }

    /// Refresh `last_activity_at` for an existing mapping.
    pub fn touch(&self, key: &K) -> MappingResult<()> {
        let mut entry = self.entries.get_mut(key).ok_or(MappingError::NotFound)?;
        entry.last_activity_at = Utc::now();
        Ok(())
    }

    /// Mutate a mapping's extra data in place.
    pub fn update_extra(&self, key: &K, f: impl FnOnce(&mut E)) -> MappingResult<()> {
        let mut entry = self.entries.get_mut(key).ok_or(MappingError::NotFound)?;
        f(&mut entry.extra);
        entry.last_activity_at = Utc::now();
        Ok(())
    }

    /// Remove a mapping outright.
    pub fn delete(&self, key: &K) -> Option<Mapping<K, E>> {
        let (_, mapping) = self.entries.remove(key)?;
        self.by_session.remove(&mapping.session_id);
        Some(mapping)
    }

    /// All mappings whose key's `scope()` equals `scope`.
    #[must_use]
    pub fn for_scope(&self, scope: &str) -> Vec<Mapping<K, E>> {
        self.entries
            .iter()
            .filter(|entry| entry.external_key.scope() == scope)
            .map(|entry| entry.clone())
            .collect()
    }

    /// Number of live mappings.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Evict every mapping idle longer than `idle_timeout`, except those
    /// whose extra data reports [`MappingExtra::protected_from_idle_eviction`].
    /// Returns the keys removed.
    pub fn cleanup_stale(&self) -> Vec<K> {
        let cutoff = Utc::now() - self.config.idle_timeout;
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.last_activity_at < cutoff && !entry.extra.protected_from_idle_eviction()
            })
            .map(|entry| entry.external_key.clone())
            .collect();
        for key in &stale {
            self.delete(key);
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), "cleaned up stale mappings");
        }
        stale
    }

    /// Evict the single entry with the smallest `last_activity_at`,
    /// regardless of eviction protection — a capacity cap must always be
    /// enforceable. Returns the evicted key, if any existed.
    pub fn cleanup_oldest(&self) -> Option<K> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_activity_at)
            .map(|entry| entry.external_key.clone())?;
        self.delete(&oldest);
        Some(oldest)
    }

    /// Start a periodic background task calling `cleanup_stale` every
    /// `interval`. Replaces any previously started task.
    pub async fn start_periodic_cleanup(&self, interval: std::time::Duration)
    where
        K: 'static,
        E: 'static,
    {
        self.stop_periodic_cleanup().await;
        let store = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_stale();
                if !removed.is_empty() {
                    info!(count = removed.len(), "periodic mapping cleanup ran");
                }
            }
        });
        *self.cleanup_task.lock().await = Some(handle);
    }

    /// Stop the periodic cleanup task, if one is running.
    pub async fn stop_periodic_cleanup(&self) {
        if let Some(handle) = self.cleanup_task.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct TestKey(String, u64);

    impl ExternalKey for TestKey {
        fn scope(&self) -> String {
            self.0.clone()
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestExtra {
        processing: bool,
    }

    impl MappingExtra for TestExtra {
        fn protected_from_idle_eviction(&self) -> bool {
            self.processing
        }
    }

    type TestStore = MappingStore<TestKey, TestExtra>;

    #[test]
    fn create_or_get_is_idempotent() {
        let store = TestStore::new(MappingConfig::default());
        let key = TestKey("owner/repo".into(), 1);
        let session = SessionId::new();
        let first = store.create_or_get(key.clone(), session);
        let second = store.create_or_get(key, session);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn for_scope_filters_by_scope() {
        let store = TestStore::new(MappingConfig::default());
        store.create_or_get(TestKey("a/repo".into(), 1), SessionId::new());
        store.create_or_get(TestKey("a/repo".into(), 2), SessionId::new());
        store.create_or_get(TestKey("b/repo".into(), 1), SessionId::new());
        assert_eq!(store.for_scope("a/repo").len(), 2);
        assert_eq!(store.for_scope("b/repo").len(), 1);
    }

    #[test]
    fn cleanup_oldest_evicts_the_single_least_recently_active() {
        let store = TestStore::new(MappingConfig::default());
        let key1 = TestKey("r".into(), 1);
        let key2 = TestKey("r".into(), 2);
        store.create_or_get(key1.clone(), SessionId::new());
        std::thread::sleep(StdDuration::from_millis(5));
        store.create_or_get(key2.clone(), SessionId::new());

        let evicted = store.cleanup_oldest().unwrap();
        assert_eq!(evicted, key1);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn cleanup_oldest_can_evict_a_protected_entry_when_it_is_the_only_candidate() {
        let store = TestStore::new(MappingConfig::default());
        let key = TestKey("r".into(), 1);
        store.create_or_get(key.clone(), SessionId::new());
        store.update_extra(&key, |extra| extra.processing = true).unwrap();

        let evicted = store.cleanup_oldest().unwrap();
        assert_eq!(evicted, key);
    }

    #[test]
    fn cleanup_stale_exempts_protected_entries() {
        let config = MappingConfig {
            idle_timeout: StdDuration::from_secs(0),
            ..MappingConfig::default()
        };
        let store = TestStore::new(config);
        let key = TestKey("r".into(), 1);
        store.create_or_get(key.clone(), SessionId::new());
        store.update_extra(&key, |extra| extra.processing = true).unwrap();

        let removed = store.cleanup_stale();
        assert!(removed.is_empty());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn create_or_get_frees_capacity_by_evicting_oldest() {
        let config = MappingConfig {
            max_mappings: 1,
            ..MappingConfig::default()
        };
        let store = TestStore::new(config);
        store.create_or_get(TestKey("r".into(), 1), SessionId::new());
        std::thread::sleep(StdDuration::from_millis(5));
        store.create_or_get(TestKey("r".into(), 2), SessionId::new());
        assert_eq!(store.count(), 1);
        assert!(store.get(&TestKey("r".into(), 1)).is_none());
    }

    #[tokio::test]
    async fn periodic_cleanup_can_be_started_and_stopped() {
        let store = TestStore::new(MappingConfig::default());
        store
            .start_periodic_cleanup(StdDuration::from_millis(10))
            .await;
        store.stop_periodic_cleanup().await;
        assert!(store.cleanup_task.lock().await.is_none());
    }
}
