use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// In-memory map guarded by a lock that is never held across an await point,
/// so reads stay synchronous.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let cache = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let value = cache.get(key).cloned();
        if value.is_some() {
            debug!("Cache HIT");
        } else {
            debug!("Cache MISS");
        }
        value
    }

    pub fn put(&self, key: K, value: V) {
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Cache PUT");
        cache.insert(key, value);
    }

    /// Inserts only when the key is vacant. Returns whether a value was written.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if cache.contains_key(&key) {
            return false;
        }
        debug!("Cache PUT (vacant)");
        cache.insert(key, value);
        true
    }

    pub fn snapshot(&self) -> HashMap<K, V> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
