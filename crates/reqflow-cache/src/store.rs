//! Cache storage with TTL and stale-window bookkeeping.

use crate::eviction::{EvictionPolicy, EvictionStore, FifoStore, LruStore};
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Entry in the cache.
#[derive(Clone, Debug)]
pub(crate) struct CacheEntry<V> {
    value: V,
    info: EntryInfo,
}

/// Timestamps and TTL of a cached entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    /// Lifetime the entry was stored with.
    pub ttl: Duration,
    pub created_at: Instant,
    /// `created_at + ttl` for a newly stored entry.
    pub expires_at: Instant,
    /// Last insertion or fresh read.
    pub last_accessed_at: Instant,
}

impl EntryInfo {
    fn new(ttl: Duration, now: Instant) -> Self {
        Self {
            ttl,
            created_at: now,
            expires_at: now + ttl,
            last_accessed_at: now,
        }
    }

    /// Returns true while `now` has not passed `expires_at`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// Outcome of a lookup.
#[derive(Debug, PartialEq)]
pub(crate) enum Lookup<V> {
    Fresh(V),
    /// Served from the stale window; carries the TTL to refresh with.
    Stale(V, Duration),
    Miss,
}

/// How a refreshed entry treats its creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshTimestamps {
    /// The refreshed entry is a new entry: `created_at` is the refresh time.
    #[default]
    Reset,
    /// Keep the original `created_at`; only the expiry moves forward.
    Preserve,
}

/// Cache store with configurable eviction policy and TTL support.
pub(crate) struct CacheStore<K, V> {
    store: Box<dyn EvictionStore<K, CacheEntry<V>>>,
    max_entries: usize,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(max_entries: usize, policy: EvictionPolicy) -> Self {
        let store: Box<dyn EvictionStore<K, CacheEntry<V>>> = match policy {
            EvictionPolicy::Lru => Box::new(LruStore::new()),
            EvictionPolicy::Fifo => Box::new(FifoStore::new()),
        };

        Self { store, max_entries }
    }

    /// Looks up `key`, serving from the stale window when `stale_window`
    /// is set. Entries past the window are removed.
    pub(crate) fn get(&mut self, key: &K, now: Instant, stale_window: Option<Duration>) -> Lookup<V> {
        let info = match self.store.peek(key) {
            Some(entry) => entry.info,
            None => return Lookup::Miss,
        };

        if info.is_fresh(now) {
            return match self.store.get_mut(key) {
                Some(entry) => {
                    entry.info.last_accessed_at = now;
                    Lookup::Fresh(entry.value.clone())
                }
                None => Lookup::Miss,
            };
        }

        let overdue = now.saturating_duration_since(info.expires_at);
        if let Some(window) = stale_window {
            if overdue <= window {
                if let Some(entry) = self.store.peek(key) {
                    return Lookup::Stale(entry.value.clone(), info.ttl);
                }
            }
        }

        self.store.remove(key);
        Lookup::Miss
    }

    /// Inserts or overwrites `key`. Returns the number of evicted entries.
    pub(crate) fn insert(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> usize {
        let entry = CacheEntry {
            value,
            info: EntryInfo::new(ttl, now),
        };
        self.store.insert(key, entry);
        self.enforce_capacity()
    }

    /// Stores a revalidated value.
    pub(crate) fn refresh(
        &mut self,
        key: K,
        value: V,
        ttl: Duration,
        now: Instant,
        timestamps: RefreshTimestamps,
    ) -> usize {
        let mut info = EntryInfo::new(ttl, now);
        if timestamps == RefreshTimestamps::Preserve {
            if let Some(existing) = self.store.peek(&key) {
                info.created_at = existing.info.created_at;
            }
        }

        self.store.insert(key, CacheEntry { value, info });
        self.enforce_capacity()
    }

    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.store.len() > self.max_entries {
            if self.store.pop_victim().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    pub(crate) fn remove(&mut self, key: &K) -> bool {
        self.store.remove(key).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
    }

    /// Returns true if `key` holds a fresh entry.
    pub(crate) fn contains(&self, key: &K, now: Instant) -> bool {
        self.store
            .peek(key)
            .is_some_and(|entry| entry.info.is_fresh(now))
    }

    pub(crate) fn info(&self, key: &K) -> Option<EntryInfo> {
        self.store.peek(key).map(|entry| entry.info)
    }

    /// Removes every entry whose expiry has passed. Returns how many.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let expired = self.store.keys_where(&|entry| !entry.info.is_fresh(now));
        for key in &expired {
            self.store.remove(key);
        }
        expired.len()
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.store.keys_where(&|_| true)
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }
}
