//! Auxiliary context tables: small side-tables keyed by their own id (e.g.
//! a PR review comment id) that carry the owning external key so they can
//! be mass-deleted when their mapping is deleted.

use std::hash::Hash;

use dashmap::DashMap;

use crate::key::ExternalKey;

/// A table of `id → (external_key, value)`, supporting mass-deletion by
/// external key.
#[derive(Debug)]
pub struct ContextTable<K, Id, V> {
    entries: DashMap<Id, (K, V)>,
}

impl<K, Id, V> Default for ContextTable<K, Id, V>
where
    Id: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, Id, V> ContextTable<K, Id, V>
where
    K: ExternalKey,
    Id: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or replace an entry.
    pub fn insert(&self, id: Id, external_key: K, value: V) {
        self.entries.insert(id, (external_key, value));
    }

    /// Look up an entry by its own id.
    #[must_use]
    pub fn get(&self, id: &Id) -> Option<V> {
        self.entries.get(id).map(|entry| entry.1.clone())
    }

    /// Remove a single entry by its own id.
    pub fn remove(&self, id: &Id) -> Option<V> {
        self.entries.remove(id).map(|(_, (_, value))| value)
    }

    /// Remove every entry carrying `external_key` — called when the owning
    /// mapping is deleted.
    pub fn delete_by_key(&self, external_key: &K) -> usize {
        let ids: Vec<Id> = self
            .entries
            .iter()
            .filter(|entry| &entry.value().0 == external_key)
            .map(|entry| entry.key().clone())
            .collect();
        for id in &ids {
            self.entries.remove(id);
        }
        ids.len()
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct TestKey(String);

    impl ExternalKey for TestKey {
        fn scope(&self) -> String {
            self.0.clone()
        }
    }

    #[test]
    fn mass_deletion_removes_only_entries_for_the_given_key() {
        let table: ContextTable<TestKey, String, &'static str> = ContextTable::new();
        let key_a = TestKey("a".into());
        let key_b = TestKey("b".into());
        table.insert("c1".into(), key_a.clone(), "first");
        table.insert("c2".into(), key_a.clone(), "second");
        table.insert("c3".into(), key_b.clone(), "third");

        let removed = table.delete_by_key(&key_a);
        assert_eq!(removed, 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&"c3".to_string()), Some("third"));
    }
}
