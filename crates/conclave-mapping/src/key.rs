//! Traits a mapping store's key and extra-data types must satisfy.

use std::hash::Hash;

/// An external-integration key, e.g. `(repo, pr_number)` or
/// `(channel_id, thread_ts)`.
///
/// `scope()` names the coarser grouping `for_scope` filters by — a repo
/// for PR keys, a channel for chat keys.
pub trait ExternalKey: Eq + Hash + Clone + Send + Sync + 'static {
    /// The scope this key belongs to.
    fn scope(&self) -> String;
}

/// Extra, integration-specific data carried alongside a mapping.
///
/// The blanket default means most integrations don't need to think about
/// eviction protection at all; only the chat adapter's `processing` status
/// overrides it.
pub trait MappingExtra: Clone + Default + Send + Sync + 'static {
    /// Whether this entry must survive an idle-timeout sweep
    /// ([`crate::MappingStore::cleanup_stale`]) even if it's gone idle.
    ///
    /// Capacity eviction ([`crate::MappingStore::cleanup_oldest`]) ignores
    /// this — a mapping store that's over `max_mappings` must still be able
    /// to free a slot.
    fn protected_from_idle_eviction(&self) -> bool {
        false
    }
}
