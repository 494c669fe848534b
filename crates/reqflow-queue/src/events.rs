//! Events emitted by the request queue.

use reqflow_core::events::Event;
use std::time::{Duration, Instant};

/// Events emitted by the request queue.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A task was accepted and is waiting for a slot.
    TaskQueued {
        component_name: String,
        timestamp: Instant,
        priority: Option<i64>,
        /// Tasks waiting after this one was added.
        pending: usize,
    },
    /// A task was dispatched.
    TaskStarted {
        component_name: String,
        timestamp: Instant,
        /// Tasks running, including this one.
        active: usize,
        /// Time spent waiting in the queue.
        waited: Duration,
    },
    /// A task released its slot.
    TaskFinished {
        component_name: String,
        timestamp: Instant,
        duration: Duration,
    },
}

impl Event for QueueEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::TaskQueued { .. } => "task_queued",
            QueueEvent::TaskStarted { .. } => "task_started",
            QueueEvent::TaskFinished { .. } => "task_finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            QueueEvent::TaskQueued { timestamp, .. }
            | QueueEvent::TaskStarted { timestamp, .. }
            | QueueEvent::TaskFinished { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            QueueEvent::TaskQueued { component_name, .. }
            | QueueEvent::TaskStarted { component_name, .. }
            | QueueEvent::TaskFinished { component_name, .. } => component_name,
        }
    }
}
