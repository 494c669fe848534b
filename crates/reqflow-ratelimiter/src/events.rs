use reqflow_core::events::Event;
use std::time::Instant;

/// Events emitted by the rate limiter.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A token was consumed and the request admitted.
    PermitAcquired {
        component_name: String,
        timestamp: Instant,
        /// Whole tokens left in the bucket after this admission.
        remaining: usize,
    },
    /// The bucket was empty and the request denied.
    PermitRejected {
        component_name: String,
        timestamp: Instant,
        retry_after: Option<std::time::Duration>,
    },
}

impl Event for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { component_name, .. }
            | RateLimiterEvent::PermitRejected { component_name, .. } => component_name,
        }
    }
}
