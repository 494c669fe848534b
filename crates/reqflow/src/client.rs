//! The orchestrating client.

use crate::config::ClientBuilder;
use crate::error::Error;
use crate::key::{CacheKeyMode, RequestKey};
use crate::middleware::{self, Middleware};
use crate::request::Request;
use crate::response::Response;
use crate::transport::BoxTransport;
use futures::future::BoxFuture;
use reqflow_cache::{Cache, CacheConfig};
use reqflow_core::{BoxError, ErrorChain};
use reqflow_queue::{QueueConfig, RequestQueue};
use reqflow_ratelimiter::{RateLimiter, RateLimiterConfig};
use reqflow_retry::{ExponentialJitterBackoff, Retry, RetryConfig};
use std::future::Future;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::time::Instant;
use tower::Service;
use tracing::{debug, info_span, warn, Instrument};

/// Executes requests through rate limiting, caching, a prioritized
/// concurrency queue and retries.
///
/// Cheap to clone; clones share every component and registered hook.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    transport: BoxTransport,
    limiter: RateLimiter,
    queue: RequestQueue,
    cache: Cache<RequestKey, Response>,
    retry: Retry<Error>,
    key_mode: CacheKeyMode,
    middleware: Middleware,
}

/// Who started a pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// A caller's `submit`.
    Caller,
    /// Background revalidation of a stale cache entry.
    Revalidation,
}

impl Client {
    /// Returns a builder with default settings.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_builder(builder: ClientBuilder, transport: BoxTransport) -> Self {
        let ClientBuilder {
            name,
            max_requests_per_second,
            burst_capacity,
            max_concurrency,
            enable_priority,
            max_cache_entries,
            enable_lru,
            default_ttl,
            stale_window,
            stale_while_revalidate,
            cleanup_interval,
            refresh_timestamps,
            cache_key_mode,
            backoff_base,
            backoff_max,
            backoff_jitter,
            rate_limiter: customize_limiter,
            queue: customize_queue,
            cache: customize_cache,
            retry: customize_retry,
            pre_send,
            post_receive,
        } = builder;

        let mut limiter = RateLimiterConfig::builder()
            .name(name.clone())
            .max_requests_per_second(max_requests_per_second);
        if let Some(burst) = burst_capacity {
            limiter = limiter.burst_capacity(burst);
        }
        if let Some(customize) = customize_limiter {
            limiter = customize(limiter);
        }

        let mut queue = QueueConfig::builder()
            .name(name.clone())
            .max_concurrency(max_concurrency)
            .enable_priority(enable_priority);
        if let Some(customize) = customize_queue {
            queue = customize(queue);
        }

        let mut retry = RetryConfig::<Error>::builder()
            .name(name.clone())
            .backoff(
                ExponentialJitterBackoff::new(backoff_base)
                    .max_delay(backoff_max)
                    .max_jitter(backoff_jitter),
            )
            .retry_on(Error::is_retry_eligible);
        if let Some(customize) = customize_retry {
            retry = customize(retry);
        }

        let middleware = Middleware::default();
        for hook in pre_send {
            middleware.add_pre_send(hook);
        }
        for hook in post_receive {
            middleware.add_post_receive(hook);
        }

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let mut cache = CacheConfig::<RequestKey, Response>::builder()
                .name(name.clone())
                .max_entries(max_cache_entries)
                .enable_lru(enable_lru)
                .default_ttl(default_ttl)
                .stale_window(stale_window)
                .stale_while_revalidate(stale_while_revalidate)
                .cleanup_interval(cleanup_interval)
                .refresh_timestamps(refresh_timestamps);
            if let Some(customize) = customize_cache {
                cache = customize(cache);
            }

            let weak = weak.clone();
            let cache = cache
                .refetch(move |key: RequestKey| {
                    let weak = weak.clone();
                    async move {
                        let inner = weak
                            .upgrade()
                            .ok_or_else(|| BoxError::from("client was dropped"))?;
                        inner
                            .run(key.request().clone(), Flow::Revalidation)
                            .await
                            .map_err(BoxError::from)
                    }
                })
                .build();

            Inner {
                name,
                transport,
                limiter: limiter.build(),
                queue: queue.build(),
                cache,
                retry: retry.build(),
                key_mode: cache_key_mode,
                middleware,
            }
        });

        Self { inner }
    }

    /// Executes a request.
    ///
    /// The request passes the pre-send hooks and the rate limiter, is served
    /// from the cache when caching is enabled and an entry is available, and
    /// otherwise goes through the queue and the retry loop. Successful
    /// responses are cached (when enabled) and passed through the
    /// post-receive hooks.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if the target is empty
    /// - [`Error::Middleware`] if a hook fails
    /// - [`Error::RateLimitExceeded`] if no token is available
    /// - [`Error::Http`], [`Error::Network`] or [`Error::Timeout`] from the
    ///   transport when the error is not retried
    /// - [`Error::RetryLimitExceeded`] when every allowed attempt failed with
    ///   a retry-eligible error
    pub async fn submit(&self, request: Request) -> Result<Response, Error> {
        self.inner.run(request, Flow::Caller).await
    }

    /// Registers a hook that transforms every request before admission.
    ///
    /// Hooks run in registration order. Background revalidation replays the
    /// already-transformed request and does not run them again.
    pub fn register_pre_send_hook<F, Fut, E>(&self, f: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Request, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.inner.middleware.add_pre_send(middleware::pre_send_hook(f));
    }

    /// Registers a hook that transforms every response returned to a caller,
    /// including cached ones.
    pub fn register_post_receive_hook<F, Fut, E>(&self, f: F)
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.inner
            .middleware
            .add_post_receive(middleware::post_receive_hook(f));
    }

    /// The response cache.
    pub fn cache(&self) -> &Cache<RequestKey, Response> {
        &self.inner.cache
    }

    /// Returns the key under which the response to `request` is cached.
    pub fn cache_key(&self, request: &Request) -> Result<RequestKey, Error> {
        RequestKey::derive(self.inner.key_mode, request)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.inner.queue
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (pre_send, post_receive) = self.inner.middleware.counts();
        f.debug_struct("Client")
            .field("name", &self.inner.name)
            .field("limiter", &self.inner.limiter)
            .field("queue", &self.inner.queue)
            .field("cache", &self.inner.cache)
            .field("key_mode", &self.inner.key_mode)
            .field("pre_send_hooks", &pre_send)
            .field("post_receive_hooks", &post_receive)
            .finish()
    }
}

impl Service<Request> for Client {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response, Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.submit(request).await })
    }
}

impl Inner {
    async fn run(self: &Arc<Self>, request: Request, flow: Flow) -> Result<Response, Error> {
        let span = info_span!(
            "request",
            client = %self.name,
            method = %request.method(),
            target = %request.target(),
            ?flow,
        );
        self.process(request, flow).instrument(span).await
    }

    async fn process(self: &Arc<Self>, request: Request, flow: Flow) -> Result<Response, Error> {
        let request = match flow {
            Flow::Caller => {
                validate(&request)?;
                let request = self.middleware.run_pre_send(request).await?;
                validate(&request)?;
                request
            }
            Flow::Revalidation => request,
        };

        if let Err(error) = self.limiter.consume() {
            debug!("rate limit exceeded");
            return Err(error.into());
        }

        let key = match (flow, request.cache().enabled) {
            (Flow::Caller, true) => Some(RequestKey::derive(self.key_mode, &request)?),
            _ => None,
        };

        if let Some(cached) = key.as_ref().and_then(|key| self.cache.get(key)) {
            debug!(status = cached.status, "served from cache");
            return self.middleware.run_post_receive(cached).await;
        }

        let response = self.execute(&request).await?;

        if let Some(key) = key {
            self.cache.set(key, response.clone(), request.cache().ttl);
        }

        match flow {
            Flow::Caller => self.middleware.run_post_receive(response).await,
            Flow::Revalidation => Ok(response),
        }
    }

    /// Runs the transport call through the queue, retrying eligible failures.
    async fn execute(self: &Arc<Self>, request: &Request) -> Result<Response, Error> {
        let result = self
            .retry
            .run_with_limit(request.max_retries(), |attempt| {
                let transport = Arc::clone(&self.transport);
                let request = request.clone();
                let priority = request.priority();
                let handle = self
                    .queue
                    .submit(move || call(transport, request), priority);
                async move {
                    debug!(attempt, "attempt queued");
                    handle.await?
                }
            })
            .await;

        result.map_err(|error| {
            let error = Error::from(error);
            if let Error::RetryLimitExceeded { attempts, source } = &error {
                warn!(attempts, error = %ErrorChain(&**source), "giving up after retries");
            }
            error
        })
    }
}

/// One transport call bounded by the request's timeout.
async fn call(transport: BoxTransport, request: Request) -> Result<Response, Error> {
    let timeout = request.timeout();
    let started = Instant::now();

    let response = match tokio::time::timeout(timeout, transport(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(error)) => return Err(Error::from_transport(error, timeout)),
        Err(_) => return Err(Error::Timeout { after: timeout }),
    };

    let response = response.with_elapsed(started.elapsed());
    if response.ok() {
        Ok(response)
    } else {
        Err(Error::http(response))
    }
}

fn validate(request: &Request) -> Result<(), Error> {
    if request.target().trim().is_empty() {
        return Err(Error::InvalidRequest("target must not be empty".into()));
    }
    Ok(())
}
