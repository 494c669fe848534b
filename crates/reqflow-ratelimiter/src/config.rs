use crate::events::RateLimiterEvent;
use reqflow_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for the token-bucket rate limiter.
pub struct RateLimiterConfig {
    pub(crate) max_requests_per_second: f64,
    pub(crate) burst_capacity: f64,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// Sustained refill rate in tokens per second.
    pub fn max_requests_per_second(&self) -> f64 {
        self.max_requests_per_second
    }

    /// Bucket capacity.
    pub fn burst_capacity(&self) -> f64 {
        self.burst_capacity
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    max_requests_per_second: f64,
    burst_capacity: Option<f64>,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_requests_per_second: 10
    /// - burst_capacity: same as max_requests_per_second
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_requests_per_second: 10.0,
            burst_capacity: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the sustained rate at which tokens are added back to the bucket.
    pub fn max_requests_per_second(mut self, rps: f64) -> Self {
        self.max_requests_per_second = rps;
        self
    }

    /// Sets the bucket capacity, i.e. how many requests may be admitted in a
    /// burst after a quiet period.
    ///
    /// When unset the capacity equals `max_requests_per_second`.
    pub fn burst_capacity(mut self, capacity: f64) -> Self {
        self.burst_capacity = Some(capacity);
        self
    }

    /// Sets the name for this rate limiter instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a request is admitted.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the number of whole tokens left in the bucket.
    ///
    /// # Example
    /// ```rust
    /// use reqflow_ratelimiter::RateLimiterConfig;
    ///
    /// let limiter = RateLimiterConfig::builder()
    ///     .max_requests_per_second(100.0)
    ///     .on_permit_acquired(|remaining| {
    ///         println!("admitted, {} tokens left", remaining);
    ///     })
    ///     .build();
    /// ```
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitAcquired { remaining, .. } = event {
                f(*remaining);
            }
        }));
        self
    }

    /// Registers a callback when a request is denied.
    ///
    /// # Callback Signature
    /// `Fn(Option<Duration>)` - Called with the suggested retry delay.
    ///
    /// # Example
    /// ```rust
    /// use reqflow_ratelimiter::RateLimiterConfig;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let rejections = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&rejections);
    ///
    /// let limiter = RateLimiterConfig::builder()
    ///     .max_requests_per_second(5.0)
    ///     .on_permit_rejected(move |_retry_after| {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///     })
    ///     .build();
    /// ```
    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Duration>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitRejected { retry_after, .. } = event {
                f(*retry_after);
            }
        }));
        self
    }

    /// Builds the configuration without creating a limiter.
    pub fn build_config(self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_requests_per_second: self.max_requests_per_second.max(0.0),
            burst_capacity: self
                .burst_capacity
                .unwrap_or(self.max_requests_per_second)
                .max(0.0),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the rate limiter.
    pub fn build(self) -> crate::RateLimiter {
        crate::RateLimiter::new(self.build_config())
    }
}
