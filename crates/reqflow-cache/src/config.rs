//! Configuration for the cache.

use crate::events::CacheEvent;
use crate::eviction::EvictionPolicy;
use crate::store::RefreshTimestamps;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqflow_core::{BoxError, EventListeners, FnListener};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Fetches a fresh value for a key during background revalidation.
pub type Refetch<K, V> = Arc<dyn Fn(K) -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync>;

/// Configuration for the cache.
pub struct CacheConfig<K, V> {
    pub(crate) max_entries: usize,
    pub(crate) eviction_policy: EvictionPolicy,
    pub(crate) default_ttl: Duration,
    pub(crate) stale_window: Duration,
    pub(crate) stale_while_revalidate: bool,
    pub(crate) cleanup_interval: Option<Duration>,
    pub(crate) refresh_timestamps: RefreshTimestamps,
    pub(crate) refetch: Option<Refetch<K, V>>,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
    pub(crate) name: String,
}

impl<K, V> CacheConfig<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder<K, V> {
        CacheConfigBuilder::new()
    }
}

impl<K, V> CacheConfig<K, V> {
    /// The window after expiry during which a stale value may be served,
    /// or `None` when stale-while-revalidate is disabled.
    pub(crate) fn serve_stale_for(&self) -> Option<Duration> {
        self.stale_while_revalidate.then_some(self.stale_window)
    }
}

/// Builder for configuring and constructing a cache.
pub struct CacheConfigBuilder<K, V> {
    max_entries: usize,
    eviction_policy: EvictionPolicy,
    default_ttl: Duration,
    stale_window: Duration,
    stale_while_revalidate: bool,
    cleanup_interval: Option<Duration>,
    refresh_timestamps: RefreshTimestamps,
    refetch: Option<Refetch<K, V>>,
    event_listeners: EventListeners<CacheEvent>,
    name: String,
}

impl<K, V> CacheConfigBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new builder with default values.
    ///
    /// Defaults:
    /// - max_entries: 1000
    /// - eviction_policy: LRU
    /// - default_ttl: 5 minutes
    /// - stale_window: 60 seconds
    /// - stale_while_revalidate: enabled
    /// - cleanup_interval: 10 minutes
    /// - refresh_timestamps: [`RefreshTimestamps::Reset`]
    pub fn new() -> Self {
        Self {
            max_entries: 1000,
            eviction_policy: EvictionPolicy::Lru,
            default_ttl: Duration::from_secs(5 * 60),
            stale_window: Duration::from_secs(60),
            stale_while_revalidate: true,
            cleanup_interval: Some(Duration::from_secs(10 * 60)),
            refresh_timestamps: RefreshTimestamps::Reset,
            refetch: None,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the maximum number of entries in the cache.
    ///
    /// Default: 1000
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the eviction policy.
    ///
    /// Default: [`EvictionPolicy::Lru`]
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Chooses LRU (`true`) or FIFO (`false`) eviction.
    pub fn enable_lru(self, enabled: bool) -> Self {
        self.eviction_policy(if enabled {
            EvictionPolicy::Lru
        } else {
            EvictionPolicy::Fifo
        })
    }

    /// Sets the TTL used when an entry is stored without one.
    ///
    /// Default: 5 minutes
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets how long after expiry a stale value may still be served.
    ///
    /// Default: 60 seconds
    pub fn stale_window(mut self, window: Duration) -> Self {
        self.stale_window = window;
        self
    }

    /// Enables or disables stale-while-revalidate.
    ///
    /// Default: enabled
    pub fn stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.stale_while_revalidate = enabled;
        self
    }

    /// Sets the period of the background sweep that drops expired entries.
    ///
    /// `None` or a zero duration disables the sweep.
    /// Default: 10 minutes
    pub fn cleanup_interval(mut self, interval: Option<Duration>) -> Self {
        self.cleanup_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Sets whether a revalidated entry keeps its original creation time.
    ///
    /// Default: [`RefreshTimestamps::Reset`]
    pub fn refresh_timestamps(mut self, timestamps: RefreshTimestamps) -> Self {
        self.refresh_timestamps = timestamps;
        self
    }

    /// Sets the function used to revalidate stale entries.
    ///
    /// Without one, stale values are still served but never refreshed.
    ///
    /// # Example
    /// ```rust
    /// use reqflow_cache::CacheConfig;
    ///
    /// let cache = CacheConfig::<String, String>::builder()
    ///     .refetch(|key: String| async move {
    ///         Ok::<_, std::io::Error>(format!("fresh value for {}", key))
    ///     })
    ///     .build();
    /// ```
    pub fn refetch<F, Fut, E>(mut self, f: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.refetch = Some(Arc::new(
            move |key: K| -> BoxFuture<'static, Result<V, BoxError>> {
                f(key).map(|result| result.map_err(Into::into)).boxed()
            },
        ));
        self
    }

    /// Sets the name of this cache instance for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback to be invoked when a fresh entry is served.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Hit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback to be invoked when a stale entry is served.
    pub fn on_stale_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::StaleHit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback to be invoked when a cache miss occurs.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Miss { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback to be invoked when an entry is evicted for capacity.
    pub fn on_eviction<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Eviction { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked with the number of entries a sweep removed.
    pub fn on_expired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Expired { count, .. } = event {
                f(*count);
            }
        }));
        self
    }

    /// Registers a callback for revalidation outcomes.
    ///
    /// # Callback Signature
    /// `Fn(Result<(), &str>)` - `Ok` when a refreshed value was stored,
    /// `Err` with the failure message otherwise.
    pub fn on_refresh<F>(mut self, f: F) -> Self
    where
        F: Fn(Result<(), &str>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| match event {
            CacheEvent::RefreshSucceeded { .. } => f(Ok(())),
            CacheEvent::RefreshFailed { error, .. } => f(Err(error.as_str())),
            _ => {}
        }));
        self
    }

    /// Builds the configuration without creating a cache.
    pub fn build_config(self) -> CacheConfig<K, V> {
        CacheConfig {
            max_entries: self.max_entries,
            eviction_policy: self.eviction_policy,
            default_ttl: self.default_ttl,
            stale_window: self.stale_window,
            stale_while_revalidate: self.stale_while_revalidate,
            cleanup_interval: self.cleanup_interval,
            refresh_timestamps: self.refresh_timestamps,
            refetch: self.refetch,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the cache.
    ///
    /// The cleanup sweep is started only when a Tokio runtime is available.
    pub fn build(self) -> crate::Cache<K, V> {
        crate::Cache::new(self.build_config())
    }
}

impl<K, V> Default for CacheConfigBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
