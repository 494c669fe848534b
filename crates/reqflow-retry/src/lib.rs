//! Retry with exponential backoff and jitter.
//!
//! The executor in this crate wraps an async operation and calls it again
//! when it fails with a retry-eligible error, sleeping between attempts
//! according to a pluggable [`IntervalFunction`].
//!
//! # Features
//!
//! - **Backoff strategies**: exponential with jitter and a cap (the default),
//!   fixed interval, or any closure
//! - **Retry predicates**: control which errors are transient
//! - **Distinct exhaustion error**: [`RetryError::Exhausted`] carries the
//!   last underlying error as its source
//! - **Event system**: observability through retry events
//!
//! # Examples
//!
//! ```
//! use reqflow_retry::{RetryConfig, RetryError};
//! use std::time::Duration;
//!
//! # #[derive(Debug)]
//! # struct Unavailable;
//! # async fn example() {
//! let retry = RetryConfig::<Unavailable>::builder()
//!     .max_retries(3)
//!     .fixed_backoff(Duration::from_millis(10))
//!     .on_retry(|attempt, delay| println!("retry {} after {:?}", attempt, delay))
//!     .build();
//!
//! let result: Result<&str, RetryError<Unavailable>> =
//!     retry.run(|_attempt| async { Ok("done") }).await;
//! assert_eq!(result.unwrap(), "done");
//! # }
//! ```

mod backoff;
mod config;
mod error;
mod events;
mod policy;

pub use backoff::{ExponentialJitterBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use error::RetryError;
pub use events::RetryEvent;
pub use policy::{RetryPolicy, RetryPredicate};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::counter;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Executes operations with retry and backoff.
///
/// Cheap to clone; clones share configuration and listeners.
pub struct Retry<E> {
    config: Arc<RetryConfig<E>>,
}

impl<E> Retry<E> {
    /// Creates a new executor from a configuration.
    pub fn new(config: RetryConfig<E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a builder for the executor configuration.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// Returns the policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.config.policy
    }

    /// Runs `operation` using the configured retry limit.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_with_limit(self.config.policy.max_retries, operation)
            .await
    }

    /// Runs `operation`, allowing at most `max_retries` retries after the
    /// initial attempt.
    ///
    /// The operation receives the zero-based attempt number. Errors rejected
    /// by the retry predicate are returned immediately as
    /// [`RetryError::NotRetryable`]; retry-eligible errors are retried after
    /// the backoff delay until the limit is reached, then reported as
    /// [`RetryError::Exhausted`].
    pub async fn run_with_limit<T, F, Fut>(
        &self,
        max_retries: usize,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let config = &self.config;
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    config.event_listeners.emit(&RetryEvent::Success {
                        component_name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "success")
                        .increment(1);

                    return Ok(value);
                }
                Err(error) => {
                    if !config.policy.should_retry(&error) {
                        config.event_listeners.emit(&RetryEvent::IgnoredError {
                            component_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                        });

                        #[cfg(feature = "tracing")]
                        debug!(retry = %config.name, attempt, "error is not retry-eligible");

                        return Err(RetryError::NotRetryable(error));
                    }

                    if attempt >= max_retries {
                        config.event_listeners.emit(&RetryEvent::Exhausted {
                            component_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        });

                        #[cfg(feature = "metrics")]
                        counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "exhausted")
                            .increment(1);

                        #[cfg(feature = "tracing")]
                        warn!(retry = %config.name, attempts = attempt + 1, "retry limit exceeded");

                        return Err(RetryError::Exhausted {
                            attempts: attempt + 1,
                            last: error,
                        });
                    }

                    let delay = config.policy.next_backoff(attempt);
                    config.event_listeners.emit(&RetryEvent::Retry {
                        component_name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        delay,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_attempts_total", "retry" => config.name.clone()).increment(1);

                    #[cfg(feature = "tracing")]
                    debug!(retry = %config.name, attempt, ?delay, "retrying after backoff");

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl<E> Clone for Retry<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}
