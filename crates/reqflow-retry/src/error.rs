//! Error type returned by the retry executor.

use std::fmt;

/// Why a retried operation ultimately failed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retry-eligible error.
    ///
    /// `last` is the error from the final attempt.
    Exhausted {
        /// Total attempts made, including the initial one.
        attempts: usize,
        /// The error returned by the final attempt.
        last: E,
    },
    /// The operation failed with an error the retry predicate rejected.
    NotRetryable(E),
}

impl<E> RetryError<E> {
    /// Returns the underlying error, discarding the retry context.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::NotRetryable(e) => e,
        }
    }

    /// Returns `true` if the retry limit was reached.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, .. } => {
                write!(f, "retry limit exceeded after {} attempts", attempts)
            }
            RetryError::NotRetryable(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::NotRetryable(e) => e.source(),
        }
    }
}
