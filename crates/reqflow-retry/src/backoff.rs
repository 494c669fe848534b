use rand::Rng;
use std::time::Duration;

/// Abstraction for computing retry intervals.
///
/// Implementations map a zero-based retry attempt number to the delay that
/// precedes that retry.
pub trait IntervalFunction: Send + Sync {
    /// Computes the delay before the next retry attempt.
    ///
    /// # Arguments
    /// * `attempt` - The retry attempt number (0-indexed, so first retry is 0)
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Fixed interval backoff - returns the same duration for every retry.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    /// Creates a new fixed interval backoff.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// Exponential backoff with additive jitter and an upper bound.
///
/// `delay = min(base × 2^attempt + jitter, max)` where `jitter` is drawn
/// uniformly from `[0, max_jitter)`.
///
/// Defaults: `base = 100ms`, `max = 30s`, `max_jitter = 50ms`.
///
/// ```
/// use reqflow_retry::{ExponentialJitterBackoff, IntervalFunction};
/// use std::time::Duration;
///
/// let backoff = ExponentialJitterBackoff::default();
/// let delay = backoff.next_interval(2);
/// assert!(delay >= Duration::from_millis(400));
/// assert!(delay < Duration::from_millis(450));
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialJitterBackoff {
    base: Duration,
    max: Duration,
    max_jitter: Duration,
}

impl Default for ExponentialJitterBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            max: Duration::from_secs(30),
            max_jitter: Duration::from_millis(50),
        }
    }
}

impl ExponentialJitterBackoff {
    /// Creates a backoff with the given base delay and default cap and jitter.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// Sets the upper bound applied after jitter is added.
    pub fn max_delay(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    /// Sets the exclusive upper bound of the random jitter.
    ///
    /// `Duration::ZERO` disables jitter.
    pub fn max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Returns the base delay.
    pub fn base_delay(&self) -> Duration {
        self.base
    }

    fn jitter(&self) -> Duration {
        let bound = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::rng().random_range(0..bound))
    }
}

impl IntervalFunction for ExponentialJitterBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let exponential = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2u32.checked_pow(exp))
            .and_then(|factor| self.base.checked_mul(factor));

        match exponential {
            Some(delay) => delay.saturating_add(self.jitter()).min(self.max),
            None => self.max,
        }
    }
}

/// Function-based interval implementation.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Creates a new function-based interval.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}
