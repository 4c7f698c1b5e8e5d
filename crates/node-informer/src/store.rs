//! The local mirror of the watched collection.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use k8s_openapi::api::core::v1::Node;

/// Extracts the cache key (identity) of a resource.
pub trait ResourceKey {
    /// The object's unique name, if it has one. Objects without a name are
    /// skipped by the informer with a warning.
    fn key(&self) -> Option<&str>;
}

impl ResourceKey for Node {
    fn key(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }
}

/// A cloneable handle onto the informer's cache.
///
/// An object is either fully present at its latest known value or absent;
/// partial state is never visible. Handlers read snapshots from here (the
/// controller's availability scan runs over `snapshot`), and must never mutate
/// objects in place: every write path clones first and persists through the
/// authoritative store.
#[derive(Debug, Default)]
pub struct Store<K> {
    inner: Arc<RwLock<BTreeMap<String, K>>>,
}

impl<K> Clone for Store<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Clone> Store<K> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Returns a copy of the cached object with the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<K> {
        self.read().get(key).cloned()
    }

    /// Returns a point-in-time copy of every cached object.
    #[must_use]
    pub fn snapshot(&self) -> Vec<K> {
        self.read().values().cloned().collect()
    }

    /// Number of cached objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Keys of every cached object.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Inserts or replaces an object, returning the previous value.
    ///
    /// Written by the informer as events arrive; also useful for seeding a
    /// store in tests.
    pub fn insert(&self, key: &str, value: K) -> Option<K> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value)
    }

    /// Removes an object, returning the previous value.
    pub fn remove(&self, key: &str) -> Option<K> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, K>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_a_point_in_time_copy() {
        let store: Store<u32> = Store::new();
        store.insert("a", 1);
        store.insert("b", 2);

        let snapshot = store.snapshot();
        store.insert("c", 3);

        assert_eq!(snapshot, vec![1, 2]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn insert_returns_previous_value() {
        let store: Store<u32> = Store::new();
        assert_eq!(store.insert("a", 1), None);
        assert_eq!(store.insert("a", 2), Some(1));
        assert_eq!(store.get("a"), Some(2));
    }

    #[test]
    fn clones_share_the_same_cache() {
        let store: Store<u32> = Store::new();
        let handle = store.clone();
        store.insert("a", 1);
        assert_eq!(handle.get("a"), Some(1));

        handle.remove("a");
        assert!(store.is_empty());
    }
}
