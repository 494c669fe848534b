use std::time::Duration;
use tokio::time::Instant;

/// Slack for float error when checking for a whole token.
const TOKEN_EPSILON: f64 = 1e-12;

/// Token bucket state.
///
/// Tokens are fractional so that partial refills accumulate between calls;
/// admission always consumes exactly one whole token.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    tokens: f64,
    capacity: f64,
    /// Tokens added per elapsed millisecond.
    refill_rate_per_ms: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub(crate) fn new(capacity: f64, refill_rate_per_ms: f64, now: Instant) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            tokens: capacity,
            capacity,
            refill_rate_per_ms: refill_rate_per_ms.max(0.0),
            last_refill: now,
        }
    }

    /// Adds the tokens accrued since the last refill, capped at capacity.
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed.is_zero() {
            return;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.tokens = (self.tokens + elapsed_ms * self.refill_rate_per_ms).min(self.capacity);
        self.last_refill = now;
    }

    /// Refills, then takes one token if a whole token is available.
    pub(crate) fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens + TOKEN_EPSILON >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    pub(crate) fn available(&mut self, now: Instant) -> f64 {
        self.refill(now);
        self.tokens
    }

    pub(crate) fn reset(&mut self, now: Instant) {
        self.tokens = self.capacity;
        self.last_refill = now;
    }

    pub(crate) fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Time needed to accumulate one token, or `None` if the bucket never refills.
    ///
    /// Rounded up to the next nanosecond so that waiting this long always
    /// earns a whole token.
    pub(crate) fn time_per_token(&self) -> Option<Duration> {
        if self.refill_rate_per_ms > 0.0 {
            let nanos = (1e9 / (self.refill_rate_per_ms * 1000.0)).ceil();
            Some(Duration::from_nanos(nanos as u64))
        } else {
            None
        }
    }
}
