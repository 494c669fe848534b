//! Token-bucket admission control.
//!
//! A bucket holds up to `burst_capacity` tokens and refills continuously at
//! `max_requests_per_second`. Every admitted request consumes one whole
//! token; when fewer than one token is available the request is denied
//! immediately with [`RateLimiterError::RateLimitExceeded`]. There is no
//! waiting: callers decide whether and when to try again.
//!
//! # Examples
//!
//! ```
//! use reqflow_ratelimiter::{RateLimiterConfig, RateLimiterError};
//!
//! let limiter = RateLimiterConfig::builder()
//!     .max_requests_per_second(10.0)
//!     .burst_capacity(2.0)
//!     .name("api")
//!     .build();
//!
//! assert!(limiter.consume().is_ok());
//! assert!(limiter.consume().is_ok());
//! assert!(matches!(
//!     limiter.consume(),
//!     Err(RateLimiterError::RateLimitExceeded { .. })
//! ));
//! ```
//!
//! The limiter reads time from [`tokio::time::Instant`], so tests can drive
//! refills with a paused runtime and `tokio::time::advance`.

mod config;
mod error;
mod events;
mod limiter;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;

use crate::limiter::TokenBucket;
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Shared token-bucket rate limiter.
///
/// Cloning is cheap; clones draw from the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    config: Arc<RateLimiterConfig>,
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimiter {
    /// Creates a limiter with a full bucket.
    pub fn new(config: RateLimiterConfig) -> Self {
        let bucket = TokenBucket::new(
            config.burst_capacity,
            config.max_requests_per_second / 1000.0,
            tokio::time::Instant::now(),
        );

        Self {
            config: Arc::new(config),
            bucket: Arc::new(Mutex::new(bucket)),
        }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// Admits one request or denies it.
    ///
    /// Refill and consumption happen under a single lock acquisition, so
    /// concurrent callers can never overdraw the bucket.
    pub fn consume(&self) -> Result<(), RateLimiterError> {
        let now = tokio::time::Instant::now();
        let (admitted, remaining, retry_after) = {
            let mut bucket = self.bucket.lock();
            let admitted = bucket.try_consume(now);
            (admitted, bucket.available(now), bucket.time_per_token())
        };

        #[cfg(feature = "metrics")]
        gauge!("ratelimiter_available_tokens", "ratelimiter" => self.config.name.clone())
            .set(remaining);

        if admitted {
            self.config
                .event_listeners
                .emit(&RateLimiterEvent::PermitAcquired {
                    component_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    remaining: remaining as usize,
                });

            #[cfg(feature = "metrics")]
            counter!("ratelimiter_calls_total", "ratelimiter" => self.config.name.clone(), "result" => "permitted")
                .increment(1);

            #[cfg(feature = "tracing")]
            debug!(ratelimiter = %self.config.name, remaining, "request admitted");

            Ok(())
        } else {
            self.config
                .event_listeners
                .emit(&RateLimiterEvent::PermitRejected {
                    component_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    retry_after,
                });

            #[cfg(feature = "metrics")]
            counter!("ratelimiter_calls_total", "ratelimiter" => self.config.name.clone(), "result" => "rejected")
                .increment(1);

            #[cfg(feature = "tracing")]
            debug!(ratelimiter = %self.config.name, ?retry_after, "request rate limited");

            Err(RateLimiterError::RateLimitExceeded { retry_after })
        }
    }

    /// Returns the tokens currently in the bucket after applying refill.
    ///
    /// The value may be fractional.
    pub fn available_tokens(&self) -> f64 {
        self.bucket.lock().available(tokio::time::Instant::now())
    }

    /// Refills the bucket to capacity.
    pub fn reset(&self) {
        self.bucket.lock().reset(tokio::time::Instant::now());
    }

    /// Returns the bucket capacity.
    pub fn capacity(&self) -> f64 {
        self.bucket.lock().capacity()
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.config.name)
            .field("bucket", &*self.bucket.lock())
            .finish()
    }
}
