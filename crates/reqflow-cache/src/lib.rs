//! In-memory response cache with TTL, bounded size and
//! stale-while-revalidate.
//!
//! # Features
//!
//! - **Per-entry TTL** with a configurable default
//! - **Bounded size** with LRU or FIFO eviction
//! - **Stale-while-revalidate**: within `stale_window` after expiry the old
//!   value is served immediately while a background refetch replaces it
//! - **Single-flight refresh**: at most one revalidation per key at a time
//! - **Cleanup sweep**: a periodic task drops expired entries nobody reads
//! - **Event System**: observability through cache events
//!
//! # Examples
//!
//! ```
//! use reqflow_cache::{CacheConfig, EvictionPolicy};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = CacheConfig::<String, String>::builder()
//!     .max_entries(100)
//!     .default_ttl(Duration::from_secs(30))
//!     .stale_window(Duration::from_secs(10))
//!     .eviction_policy(EvictionPolicy::Lru)
//!     .refetch(|key: String| async move {
//!         Ok::<_, std::io::Error>(format!("refetched {}", key))
//!     })
//!     .on_stale_hit(|| println!("served stale"))
//!     .build();
//!
//! cache.set("greeting".to_string(), "hello".to_string(), None);
//! assert_eq!(cache.get(&"greeting".to_string()), Some("hello".to_string()));
//! # }
//! ```
//!
//! Time is read from [`tokio::time::Instant`], so expiry can be tested with
//! a paused runtime.

mod config;
mod events;
mod eviction;
mod store;

pub use config::{CacheConfig, CacheConfigBuilder, Refetch};
pub use events::CacheEvent;
pub use eviction::EvictionPolicy;
pub use store::{EntryInfo, RefreshTimestamps};

use parking_lot::Mutex;
use reqflow_core::ErrorChain;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use store::{CacheStore, Lookup};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

struct Inner<K, V> {
    store: CacheStore<K, V>,
    /// Keys with a revalidation in progress.
    in_flight: HashSet<K>,
}

struct Shared<K, V> {
    inner: Mutex<Inner<K, V>>,
    config: CacheConfig<K, V>,
}

/// A bounded in-memory cache.
///
/// Cloning is cheap; clones share the same entries. The cleanup sweep stops
/// when the last clone is dropped or [`Cache::stop_cleanup`] is called.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
    sweeper: Arc<Sweeper>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            sweeper: Arc::clone(&self.sweeper),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache from a configuration.
    ///
    /// When a cleanup interval is configured, the periodic sweep is spawned
    /// onto the current Tokio runtime. Without one, it starts on the first
    /// `get` or `set` made from inside a runtime.
    pub fn new(config: CacheConfig<K, V>) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "cache_requests_total",
                "Total number of cache lookups (hits, stale hits and misses)"
            );
            describe_counter!("cache_evictions_total", "Total number of cache evictions");
            describe_gauge!("cache_size", "Current number of entries in the cache");
        }

        let cleanup_interval = config.cleanup_interval;
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                store: CacheStore::new(config.max_entries, config.eviction_policy),
                in_flight: HashSet::new(),
            }),
            config,
        });

        let cache = Self {
            shared,
            sweeper: Arc::new(Sweeper {
                period: cleanup_interval,
                state: Mutex::new(SweepState::Idle),
            }),
        };

        let started = cache.sweeper.ensure_started(&cache.shared);

        #[cfg(feature = "tracing")]
        if !started && cleanup_interval.is_some() {
            debug!(cache = %cache.shared.config.name, "no runtime yet, cleanup sweep deferred");
        }

        #[cfg(not(feature = "tracing"))]
        let _ = started;

        cache
    }

    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder<K, V> {
        CacheConfigBuilder::new()
    }

    /// Looks up a key.
    ///
    /// Returns the value when the entry is fresh, or when it expired less
    /// than `stale_window` ago and stale-while-revalidate is enabled. In the
    /// stale case a background refetch is started unless one is already
    /// running for the key. Entries past the stale window are removed.
    pub fn get(&self, key: &K) -> Option<V> {
        self.sweeper.ensure_started(&self.shared);
        let config = &self.shared.config;
        let now = Instant::now();

        let (lookup, claimed) = {
            let mut inner = self.shared.inner.lock();
            let lookup = inner.store.get(key, now, config.serve_stale_for());
            let claimed = match &lookup {
                Lookup::Stale(..) => self.claim_refresh(&mut inner, key),
                _ => None,
            };
            (lookup, claimed)
        };

        match lookup {
            Lookup::Fresh(value) => {
                self.shared.emit(CacheEvent::Hit {
                    component_name: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                });

                #[cfg(feature = "metrics")]
                counter!("cache_requests_total", "cache" => config.name.clone(), "result" => "hit")
                    .increment(1);

                #[cfg(feature = "tracing")]
                debug!(cache = %config.name, "cache hit");

                Some(value)
            }
            Lookup::Stale(value, ttl) => {
                self.shared.emit(CacheEvent::StaleHit {
                    component_name: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                });

                #[cfg(feature = "metrics")]
                counter!("cache_requests_total", "cache" => config.name.clone(), "result" => "stale")
                    .increment(1);

                #[cfg(feature = "tracing")]
                debug!(cache = %config.name, refreshing = claimed.is_some(), "serving stale entry");

                if let Some((runtime, refetch)) = claimed {
                    self.spawn_refresh(runtime, refetch, key.clone(), ttl);
                }

                Some(value)
            }
            Lookup::Miss => {
                self.shared.emit(CacheEvent::Miss {
                    component_name: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                });

                #[cfg(feature = "metrics")]
                counter!("cache_requests_total", "cache" => config.name.clone(), "result" => "miss")
                    .increment(1);

                #[cfg(feature = "tracing")]
                debug!(cache = %config.name, "cache miss");

                None
            }
        }
    }

    /// Stores a value, overwriting any existing entry.
    ///
    /// `ttl = None` uses the configured default TTL. If the cache grows past
    /// `max_entries`, one entry is evicted according to the policy.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        self.sweeper.ensure_started(&self.shared);
        let ttl = ttl.unwrap_or(self.shared.config.default_ttl);
        let evicted = {
            let mut inner = self.shared.inner.lock();
            inner.store.insert(key, value, ttl, Instant::now())
        };
        self.shared.record_evictions(evicted);
    }

    /// Removes an entry. Returns true if it existed.
    pub fn delete(&self, key: &K) -> bool {
        self.shared.inner.lock().store.remove(key)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.shared.inner.lock().store.clear();

        #[cfg(feature = "metrics")]
        gauge!("cache_size", "cache" => self.shared.config.name.clone()).set(0.0);
    }

    /// Returns true if a fresh entry exists for `key`.
    ///
    /// Does not count as an access.
    pub fn contains(&self, key: &K) -> bool {
        self.shared.inner.lock().store.contains(key, Instant::now())
    }

    /// Returns the number of entries after dropping expired ones.
    pub fn len(&self) -> usize {
        self.shared.purge_expired();
        self.shared.inner.lock().store.len()
    }

    /// Returns true if no unexpired entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the keys after dropping expired entries, oldest in
    /// eviction order first.
    pub fn keys(&self) -> Vec<K> {
        self.shared.purge_expired();
        self.shared.inner.lock().store.keys()
    }

    /// Drops every entry whose expiry has passed and returns how many.
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    /// Returns the timestamps and TTL of an entry, fresh or not.
    pub fn entry_info(&self, key: &K) -> Option<EntryInfo> {
        self.shared.inner.lock().store.info(key)
    }

    /// Returns the number of revalidations currently running.
    pub fn in_flight_refreshes(&self) -> usize {
        self.shared.inner.lock().in_flight.len()
    }

    /// Returns true if `key` is being revalidated.
    pub fn is_refreshing(&self, key: &K) -> bool {
        self.shared.inner.lock().in_flight.contains(key)
    }

    /// Returns the TTL applied when none is given.
    pub fn default_ttl(&self) -> Duration {
        self.shared.config.default_ttl
    }

    /// Returns true while the periodic cleanup sweep is running.
    pub fn cleanup_running(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Stops the periodic cleanup sweep for good. Lookups still drop expired
    /// entries lazily.
    pub fn stop_cleanup(&self) {
        self.sweeper.stop();
    }

    /// Marks `key` as refreshing if a refetch can be started for it.
    fn claim_refresh(&self, inner: &mut Inner<K, V>, key: &K) -> Option<(Handle, Refetch<K, V>)> {
        let refetch = self.shared.config.refetch.clone()?;
        if inner.in_flight.contains(key) {
            return None;
        }
        let runtime = Handle::try_current().ok()?;
        inner.in_flight.insert(key.clone());
        Some((runtime, refetch))
    }

    fn spawn_refresh(&self, runtime: Handle, refetch: Refetch<K, V>, key: K, ttl: Duration) {
        let shared = Arc::clone(&self.shared);

        runtime.spawn(async move {
            let _guard = InFlightGuard {
                shared: Arc::clone(&shared),
                key: key.clone(),
            };
            let config = &shared.config;

            shared.emit(CacheEvent::RefreshStarted {
                component_name: config.name.clone(),
                timestamp: std::time::Instant::now(),
            });

            match refetch(key.clone()).await {
                Ok(value) => {
                    let evicted = {
                        let mut inner = shared.inner.lock();
                        inner.store.refresh(
                            key,
                            value,
                            ttl,
                            Instant::now(),
                            config.refresh_timestamps,
                        )
                    };
                    shared.record_evictions(evicted);

                    shared.emit(CacheEvent::RefreshSucceeded {
                        component_name: config.name.clone(),
                        timestamp: std::time::Instant::now(),
                    });

                    #[cfg(feature = "tracing")]
                    debug!(cache = %config.name, "stale entry revalidated");
                }
                Err(error) => {
                    let error = ErrorChain(&*error).to_string();

                    #[cfg(feature = "tracing")]
                    warn!(cache = %config.name, %error, "revalidation failed, keeping stale entry");

                    shared.emit(CacheEvent::RefreshFailed {
                        component_name: config.name.clone(),
                        timestamp: std::time::Instant::now(),
                        error,
                    });
                }
            }
        });
    }
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.shared.config.name)
            .field("max_entries", &self.shared.config.max_entries)
            .field("eviction_policy", &self.shared.config.eviction_policy)
            .finish_non_exhaustive()
    }
}

impl<K, V> Shared<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn emit(&self, event: CacheEvent) {
        self.config.event_listeners.emit(&event);
    }

    fn record_evictions(&self, evicted: usize) {
        for _ in 0..evicted {
            self.emit(CacheEvent::Eviction {
                component_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
            });
        }

        #[cfg(feature = "metrics")]
        {
            counter!("cache_evictions_total", "cache" => self.config.name.clone())
                .increment(evicted as u64);
            let size = self.inner.lock().store.len();
            gauge!("cache_size", "cache" => self.config.name.clone()).set(size as f64);
        }

        #[cfg(feature = "tracing")]
        if evicted > 0 {
            debug!(cache = %self.config.name, evicted, "evicted entries over capacity");
        }
    }

    fn purge_expired(&self) -> usize {
        let count = self.inner.lock().store.purge_expired(Instant::now());
        if count > 0 {
            self.emit(CacheEvent::Expired {
                component_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                count,
            });

            #[cfg(feature = "tracing")]
            debug!(cache = %self.config.name, count, "dropped expired entries");
        }
        count
    }
}

/// Removes a key from the in-flight set when its refresh ends, however it ends.
struct InFlightGuard<K: Hash + Eq, V> {
    shared: Arc<Shared<K, V>>,
    key: K,
}

impl<K: Hash + Eq, V> Drop for InFlightGuard<K, V> {
    fn drop(&mut self) {
        self.shared.inner.lock().in_flight.remove(&self.key);
    }
}

enum SweepState {
    /// Not spawned yet, waiting for a runtime.
    Idle,
    Running(JoinHandle<()>),
    Stopped,
}

struct Sweeper {
    period: Option<Duration>,
    state: Mutex<SweepState>,
}

impl Sweeper {
    /// Spawns the sweep if it is configured, not running and a runtime is
    /// current. Returns true if a sweep is running afterwards.
    fn ensure_started<K, V>(&self, shared: &Arc<Shared<K, V>>) -> bool
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let Some(period) = self.period else {
            return false;
        };

        let mut state = self.state.lock();
        match &*state {
            SweepState::Stopped => return false,
            // a sweep whose runtime shut down is restarted on the current one
            SweepState::Running(handle) if !handle.is_finished() => return true,
            _ => {}
        }

        match Handle::try_current() {
            Ok(runtime) => {
                *state = SweepState::Running(runtime.spawn(sweep(Arc::downgrade(shared), period)));
                true
            }
            Err(_) => false,
        }
    }

    fn is_running(&self) -> bool {
        matches!(&*self.state.lock(), SweepState::Running(handle) if !handle.is_finished())
    }

    fn stop(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SweepState::Stopped);
        if let SweepState::Running(handle) = previous {
            handle.abort();
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep<K, V>(shared: Weak<Shared<K, V>>, period: Duration)
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.purge_expired();
    }
}
