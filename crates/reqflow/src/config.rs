//! Client configuration: the [`ClientBuilder`] and its serializable
//! counterpart [`ClientSettings`].

use crate::client::Client;
use crate::error::Error;
use crate::key::{CacheKeyMode, RequestKey};
use crate::middleware::{self, PostReceiveHook, PreSendHook};
use crate::request::{millis, millis_opt, Request};
use crate::response::Response;
use crate::transport::{self, TransportError};
use reqflow_cache::{CacheConfigBuilder, RefreshTimestamps};
use reqflow_core::BoxError;
use reqflow_queue::QueueConfigBuilder;
use reqflow_ratelimiter::RateLimiterConfigBuilder;
use reqflow_retry::RetryConfigBuilder;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tower::Service;

type Customize<B> = Box<dyn FnOnce(B) -> B + Send>;

/// Builder for a [`Client`].
///
/// Component settings are applied first; the `configure_*` closures run
/// afterwards and may override them or register event listeners.
///
/// # Example
///
/// ```
/// use reqflow::{Client, Request, Response, TransportError};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .max_requests_per_second(5.0)
///     .burst_capacity(10.0)
///     .max_concurrency(2)
///     .default_ttl(Duration::from_secs(30))
///     .configure_retry(|retry| retry.on_retry(|attempt, delay| {
///         println!("retry {} in {:?}", attempt, delay);
///     }))
///     .build(tower::service_fn(|request: Request| async move {
///         Ok::<_, TransportError>(Response::new(&request, 200))
///     }));
/// # drop(client);
/// ```
pub struct ClientBuilder {
    pub(crate) name: String,
    pub(crate) max_requests_per_second: f64,
    pub(crate) burst_capacity: Option<f64>,
    pub(crate) max_concurrency: usize,
    pub(crate) enable_priority: bool,
    pub(crate) max_cache_entries: usize,
    pub(crate) enable_lru: bool,
    pub(crate) default_ttl: Duration,
    pub(crate) stale_window: Duration,
    pub(crate) stale_while_revalidate: bool,
    pub(crate) cleanup_interval: Option<Duration>,
    pub(crate) refresh_timestamps: RefreshTimestamps,
    pub(crate) cache_key_mode: CacheKeyMode,
    pub(crate) backoff_base: Duration,
    pub(crate) backoff_max: Duration,
    pub(crate) backoff_jitter: Duration,
    pub(crate) rate_limiter: Option<Customize<RateLimiterConfigBuilder>>,
    pub(crate) queue: Option<Customize<QueueConfigBuilder>>,
    pub(crate) cache: Option<Customize<CacheConfigBuilder<RequestKey, Response>>>,
    pub(crate) retry: Option<Customize<RetryConfigBuilder<Error>>>,
    pub(crate) pre_send: Vec<PreSendHook>,
    pub(crate) post_receive: Vec<PostReceiveHook>,
}

impl ClientBuilder {
    /// Creates a builder with default values.
    ///
    /// Defaults:
    /// - max_requests_per_second: 10
    /// - burst_capacity: same as max_requests_per_second
    /// - max_concurrency: 10
    /// - enable_priority: false
    /// - max_cache_entries: 1000
    /// - enable_lru: true
    /// - default_ttl: 5 minutes
    /// - stale_window: 60 seconds
    /// - stale_while_revalidate: true
    /// - cleanup_interval: 10 minutes
    /// - backoff: 100ms base, 30s cap, up to 50ms jitter
    pub fn new() -> Self {
        Self::from_settings(ClientSettings::default())
    }

    /// Creates a builder from deserialized settings.
    pub fn from_settings(settings: ClientSettings) -> Self {
        Self {
            name: String::from("reqflow"),
            max_requests_per_second: settings.max_requests_per_second,
            burst_capacity: settings.burst_capacity,
            max_concurrency: settings.max_concurrency,
            enable_priority: settings.enable_priority,
            max_cache_entries: settings.max_cache_entries,
            enable_lru: settings.enable_lru,
            default_ttl: settings.default_ttl,
            stale_window: settings.stale_window,
            stale_while_revalidate: settings.enable_stale_while_revalidate,
            cleanup_interval: settings.cleanup_interval,
            refresh_timestamps: RefreshTimestamps::default(),
            cache_key_mode: settings.cache_key_mode,
            backoff_base: settings.backoff_base,
            backoff_max: settings.backoff_max,
            backoff_jitter: settings.backoff_jitter,
            rate_limiter: None,
            queue: None,
            cache: None,
            retry: None,
            pre_send: Vec::new(),
            post_receive: Vec::new(),
        }
    }

    /// Sets the client name used by every component in events, logs and metrics.
    ///
    /// Default: `"reqflow"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the token refill rate.
    pub fn max_requests_per_second(mut self, rps: f64) -> Self {
        self.max_requests_per_second = rps;
        self
    }

    /// Sets the token bucket capacity.
    pub fn burst_capacity(mut self, capacity: f64) -> Self {
        self.burst_capacity = Some(capacity);
        self
    }

    /// Sets how many transport calls may run at once.
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Dispatches queued calls by request priority instead of arrival order.
    pub fn enable_priority(mut self, enabled: bool) -> Self {
        self.enable_priority = enabled;
        self
    }

    /// Sets the maximum number of cached responses.
    pub fn max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = max;
        self
    }

    /// Chooses LRU (`true`) or FIFO (`false`) cache eviction.
    pub fn enable_lru(mut self, enabled: bool) -> Self {
        self.enable_lru = enabled;
        self
    }

    /// Sets the TTL for cached responses whose request names none.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn stale_window(mut self, window: Duration) -> Self {
        self.stale_window = window;
        self
    }

    pub fn stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.stale_while_revalidate = enabled;
        self
    }

    /// Sets the period of the expired-entry sweep; `None` disables it.
    pub fn cleanup_interval(mut self, interval: Option<Duration>) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets whether revalidated entries keep their original creation time.
    pub fn refresh_timestamps(mut self, timestamps: RefreshTimestamps) -> Self {
        self.refresh_timestamps = timestamps;
        self
    }

    /// Sets which parts of a request identify its cached response.
    pub fn cache_key_mode(mut self, mode: CacheKeyMode) -> Self {
        self.cache_key_mode = mode;
        self
    }

    /// Sets the backoff base delay, doubled for every further retry.
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Sets the upper bound on a single backoff delay.
    pub fn backoff_max(mut self, max: Duration) -> Self {
        self.backoff_max = max;
        self
    }

    /// Sets the exclusive upper bound of the random jitter added to each delay.
    pub fn backoff_jitter(mut self, jitter: Duration) -> Self {
        self.backoff_jitter = jitter;
        self
    }

    /// Adjusts the rate limiter configuration after the client settings are applied.
    pub fn configure_rate_limiter<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RateLimiterConfigBuilder) -> RateLimiterConfigBuilder + Send + 'static,
    {
        self.rate_limiter = Some(Box::new(f));
        self
    }

    /// Adjusts the queue configuration after the client settings are applied.
    pub fn configure_queue<F>(mut self, f: F) -> Self
    where
        F: FnOnce(QueueConfigBuilder) -> QueueConfigBuilder + Send + 'static,
    {
        self.queue = Some(Box::new(f));
        self
    }

    /// Adjusts the cache configuration after the client settings are applied.
    ///
    /// The revalidation function is installed by the client and replaces
    /// any set here.
    pub fn configure_cache<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CacheConfigBuilder<RequestKey, Response>) -> CacheConfigBuilder<RequestKey, Response>
            + Send
            + 'static,
    {
        self.cache = Some(Box::new(f));
        self
    }

    /// Adjusts the retry configuration after the client settings are applied.
    ///
    /// Use this to install a custom [`IntervalFunction`](reqflow_retry::IntervalFunction)
    /// or to listen for retry events.
    pub fn configure_retry<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RetryConfigBuilder<Error>) -> RetryConfigBuilder<Error> + Send + 'static,
    {
        self.retry = Some(Box::new(f));
        self
    }

    /// Adds a pre-send hook. See [`Client::register_pre_send_hook`].
    pub fn pre_send_hook<F, Fut, E>(mut self, f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Request, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.pre_send.push(middleware::pre_send_hook(f));
        self
    }

    /// Adds a post-receive hook. See [`Client::register_post_receive_hook`].
    pub fn post_receive_hook<F, Fut, E>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.post_receive.push(middleware::post_receive_hook(f));
        self
    }

    /// Builds the client around a transport.
    ///
    /// The transport is any cloneable service from [`Request`] to
    /// [`Response`], such as a `tower::service_fn` closure.
    pub fn build<S>(self, transport: S) -> Client
    where
        S: Service<Request, Response = Response, Error = TransportError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Client::from_builder(self, transport::boxed(transport))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ClientSettings> for ClientBuilder {
    fn from(settings: ClientSettings) -> Self {
        Self::from_settings(settings)
    }
}

/// Client options in their serialized form.
///
/// Field names are camelCase and durations are milliseconds. Missing
/// fields take their default.
///
/// ```
/// use reqflow::ClientSettings;
/// use std::time::Duration;
///
/// let settings: ClientSettings = serde_json::from_str(
///     r#"{ "maxRequestsPerSecond": 2, "enableLRU": false, "defaultTTL": 1000 }"#,
/// ).unwrap();
/// assert_eq!(settings.max_requests_per_second, 2.0);
/// assert!(!settings.enable_lru);
/// assert_eq!(settings.default_ttl, Duration::from_secs(1));
/// assert_eq!(settings.max_concurrency, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub max_requests_per_second: f64,
    pub burst_capacity: Option<f64>,
    pub max_concurrency: usize,
    pub enable_priority: bool,
    pub max_cache_entries: usize,
    #[serde(rename = "enableLRU")]
    pub enable_lru: bool,
    #[serde(rename = "defaultTTL", with = "millis")]
    pub default_ttl: Duration,
    #[serde(with = "millis")]
    pub stale_window: Duration,
    pub enable_stale_while_revalidate: bool,
    #[serde(with = "millis_opt")]
    pub cleanup_interval: Option<Duration>,
    pub cache_key_mode: CacheKeyMode,
    #[serde(with = "millis")]
    pub backoff_base: Duration,
    #[serde(with = "millis")]
    pub backoff_max: Duration,
    #[serde(with = "millis")]
    pub backoff_jitter: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            max_requests_per_second: 10.0,
            burst_capacity: None,
            max_concurrency: 10,
            enable_priority: false,
            max_cache_entries: 1000,
            enable_lru: true,
            default_ttl: Duration::from_secs(5 * 60),
            stale_window: Duration::from_secs(60),
            enable_stale_while_revalidate: true,
            cleanup_interval: Some(Duration::from_secs(10 * 60)),
            cache_key_mode: CacheKeyMode::MethodAndTarget,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(30),
            backoff_jitter: Duration::from_millis(50),
        }
    }
}
