//! Events emitted by the cache.

use reqflow_core::events::Event;
use std::time::Instant;

/// Events emitted by the cache.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A fresh entry was served.
    Hit {
        component_name: String,
        timestamp: Instant,
    },
    /// An expired entry inside the stale window was served.
    StaleHit {
        component_name: String,
        timestamp: Instant,
    },
    /// No servable entry existed.
    Miss {
        component_name: String,
        timestamp: Instant,
    },
    /// An entry was removed to make room for a new one.
    Eviction {
        component_name: String,
        timestamp: Instant,
    },
    /// Expired entries were swept.
    Expired {
        component_name: String,
        timestamp: Instant,
        count: usize,
    },
    /// A background revalidation began.
    RefreshStarted {
        component_name: String,
        timestamp: Instant,
    },
    /// A background revalidation stored a new value.
    RefreshSucceeded {
        component_name: String,
        timestamp: Instant,
    },
    /// A background revalidation failed; the stale entry was kept.
    RefreshFailed {
        component_name: String,
        timestamp: Instant,
        error: String,
    },
}

impl Event for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::StaleHit { .. } => "stale_hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Eviction { .. } => "eviction",
            CacheEvent::Expired { .. } => "expired",
            CacheEvent::RefreshStarted { .. } => "refresh_started",
            CacheEvent::RefreshSucceeded { .. } => "refresh_succeeded",
            CacheEvent::RefreshFailed { .. } => "refresh_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::StaleHit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Eviction { timestamp, .. }
            | CacheEvent::Expired { timestamp, .. }
            | CacheEvent::RefreshStarted { timestamp, .. }
            | CacheEvent::RefreshSucceeded { timestamp, .. }
            | CacheEvent::RefreshFailed { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            CacheEvent::Hit { component_name, .. }
            | CacheEvent::StaleHit { component_name, .. }
            | CacheEvent::Miss { component_name, .. }
            | CacheEvent::Eviction { component_name, .. }
            | CacheEvent::Expired { component_name, .. }
            | CacheEvent::RefreshStarted { component_name, .. }
            | CacheEvent::RefreshSucceeded { component_name, .. }
            | CacheEvent::RefreshFailed { component_name, .. } => component_name,
        }
    }
}
