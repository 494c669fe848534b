use std::time::Duration;

/// Errors produced by the rate limiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimiterError {
    /// No whole token was available at the time of the request.
    ///
    /// `retry_after` is the time needed to accumulate one token at the
    /// configured refill rate, or `None` if the bucket never refills.
    #[error("rate limit exceeded")]
    RateLimitExceeded {
        /// Suggested wait before trying again.
        retry_after: Option<Duration>,
    },
}

impl RateLimiterError {
    /// Returns the suggested wait before the next attempt, if known.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimiterError::RateLimitExceeded { retry_after } => *retry_after,
        }
    }
}
