//! The error type returned by [`Client::submit`](crate::Client::submit).

use crate::response::Response;
use crate::transport::TransportError;
use reqflow_core::BoxError;
use reqflow_queue::QueueError;
use reqflow_ratelimiter::RateLimiterError;
use reqflow_retry::RetryError;
use std::time::Duration;

/// Why a request did not produce a successful response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request descriptor was rejected before admission.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport failed to reach the target.
    #[error("network error: {0}")]
    Network(String),

    /// An attempt did not complete within the request's timeout.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The transport returned a non-2xx status.
    #[error("HTTP error: status {status}")]
    Http {
        status: u16,
        response: Box<Response>,
    },

    /// The rate limiter denied admission.
    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Every allowed attempt failed with a retry-eligible error.
    ///
    /// `source` is the failure of the final attempt.
    #[error("retry limit exceeded after {attempts} attempts")]
    RetryLimitExceeded {
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    /// A pre-send or post-receive hook failed.
    #[error("middleware hook failed")]
    Middleware(#[source] BoxError),

    /// The queued attempt ended without a result.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl Error {
    /// Returns true for transient failures worth retrying: network errors,
    /// timeouts and 5xx statuses.
    pub fn is_retry_eligible(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout { .. } => true,
            Error::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the rate limiter denied the request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }

    /// Returns the HTTP status carried by this error, looking through retry
    /// exhaustion to the final attempt.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::RetryLimitExceeded { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Returns the response behind an HTTP error.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Http { response, .. } => Some(response),
            Error::RetryLimitExceeded { source, .. } => source.response(),
            _ => None,
        }
    }

    pub(crate) fn http(response: Response) -> Self {
        Error::Http {
            status: response.status,
            response: Box::new(response),
        }
    }

    pub(crate) fn from_transport(error: TransportError, timeout: Duration) -> Self {
        match error {
            TransportError::Network(message) => Error::Network(message),
            TransportError::Timeout => Error::Timeout { after: timeout },
        }
    }
}

impl From<RateLimiterError> for Error {
    fn from(error: RateLimiterError) -> Self {
        Error::RateLimitExceeded {
            retry_after: error.retry_after(),
        }
    }
}

impl From<RetryError<Error>> for Error {
    fn from(error: RetryError<Error>) -> Self {
        match error {
            RetryError::Exhausted { attempts, last } => Error::RetryLimitExceeded {
                attempts,
                source: Box::new(last),
            },
            RetryError::NotRetryable(error) => error,
        }
    }
}
