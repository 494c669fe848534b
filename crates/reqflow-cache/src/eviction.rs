//! Cache eviction policies.
//!
//! When an insertion pushes the cache over capacity, exactly one entry is
//! removed. Which one depends on the policy.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Eviction policy for the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Least Recently Used - evicts the entry read or written longest ago.
    ///
    /// Only fresh reads count as access; serving a stale value does not.
    #[default]
    Lru,

    /// First In, First Out - evicts the oldest insertion regardless of
    /// access pattern. Overwriting a key keeps its original position.
    Fifo,
}

/// Storage that tracks eviction order.
pub(crate) trait EvictionStore<K, V>: Send + Sync {
    /// Gets a value and records the access.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Gets a value without recording an access.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Inserts or overwrites a value, returning the previous one.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Removes a specific key.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes the next entry in eviction order.
    fn pop_victim(&mut self) -> Option<(K, V)>;

    /// Returns keys whose value matches `predicate`, in eviction order.
    fn keys_where(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<K>;

    fn len(&self) -> usize;

    fn clear(&mut self);
}

/// LRU storage backed by [`lru::LruCache`].
///
/// Capacity is enforced by the owning store, so the inner cache is
/// unbounded.
pub(crate) struct LruStore<K: Hash + Eq, V> {
    cache: lru::LruCache<K, V>,
}

impl<K: Hash + Eq, V> LruStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            cache: lru::LruCache::unbounded(),
        }
    }
}

impl<K, V> EvictionStore<K, V> for LruStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.cache.get_mut(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.cache.peek(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.cache.put(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.cache.pop(key)
    }

    fn pop_victim(&mut self) -> Option<(K, V)> {
        self.cache.pop_lru()
    }

    fn keys_where(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<K> {
        // LruCache iterates most recent first.
        let mut keys: Vec<K> = self
            .cache
            .iter()
            .filter(|&(_, v)| predicate(v))
            .map(|(k, _)| k.clone())
            .collect();
        keys.reverse();
        keys
    }

    fn len(&self) -> usize {
        self.cache.len()
    }

    fn clear(&mut self) {
        self.cache.clear();
    }
}

/// FIFO storage.
pub(crate) struct FifoStore<K, V> {
    data: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Hash + Eq + Clone, V> FifoStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            data: HashMap::new(),
            order: VecDeque::new(),
        }
    }
}

impl<K, V> EvictionStore<K, V> for FifoStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.data.get_mut(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.data.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        // Overwrites keep their position.
        if let Some(slot) = self.data.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }

        self.order.push_back(key.clone());
        self.data.insert(key, value);
        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.data.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    fn pop_victim(&mut self) -> Option<(K, V)> {
        while let Some(key) = self.order.pop_front() {
            if let Some(value) = self.data.remove(&key) {
                return Some((key, value));
            }
        }
        None
    }

    fn keys_where(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<K> {
        self.order
            .iter()
            .filter(|k| self.data.get(*k).is_some_and(predicate))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn clear(&mut self) {
        self.data.clear();
        self.order.clear();
    }
}
