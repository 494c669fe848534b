//! Configuration for the request queue.

use crate::events::QueueEvent;
use reqflow_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for the request queue.
#[derive(Clone)]
pub struct QueueConfig {
    /// Maximum number of tasks running at once.
    pub(crate) max_concurrency: usize,
    /// Whether pending tasks are ordered by priority.
    pub(crate) enable_priority: bool,
    /// Name of this queue instance.
    pub(crate) name: String,
    /// Event listeners.
    pub(crate) event_listeners: EventListeners<QueueEvent>,
}

impl QueueConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::new()
    }
}

/// Builder for queue configuration.
pub struct QueueConfigBuilder {
    max_concurrency: usize,
    enable_priority: bool,
    name: String,
    event_listeners: EventListeners<QueueEvent>,
}

impl QueueConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            max_concurrency: 10,
            enable_priority: false,
            name: "queue".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the maximum number of tasks running at once.
    ///
    /// Values below 1 are treated as 1.
    /// Default: 10
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Enables priority ordering of pending tasks.
    ///
    /// When enabled the lowest priority number runs first and tasks without
    /// a priority run last; equal priorities keep submission order. When
    /// disabled the queue is strictly first-in first-out.
    /// Default: false
    pub fn enable_priority(mut self, enabled: bool) -> Self {
        self.enable_priority = enabled;
        self
    }

    /// Sets the name of this queue instance.
    ///
    /// Default: "queue"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a task is queued.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the number of pending tasks.
    pub fn on_task_queued<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let QueueEvent::TaskQueued { pending, .. } = event {
                f(*pending);
            }
        }));
        self
    }

    /// Registers a callback when a task is dispatched.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - Called with the number of running tasks
    /// (including this one) and the time the task spent waiting.
    ///
    /// # Example
    /// ```rust
    /// use reqflow_queue::QueueConfig;
    ///
    /// let queue = QueueConfig::builder()
    ///     .max_concurrency(4)
    ///     .on_task_started(|active, waited| {
    ///         println!("{} running, waited {:?}", active, waited);
    ///     })
    ///     .build();
    /// ```
    pub fn on_task_started<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let QueueEvent::TaskStarted { active, waited, .. } = event {
                f(*active, *waited);
            }
        }));
        self
    }

    /// Registers a callback when a task releases its slot.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with how long the task ran.
    pub fn on_task_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let QueueEvent::TaskFinished { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Builds the configuration without creating a queue.
    pub fn build_config(self) -> QueueConfig {
        QueueConfig {
            max_concurrency: self.max_concurrency.max(1),
            enable_priority: self.enable_priority,
            name: self.name,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the queue.
    pub fn build(self) -> crate::RequestQueue {
        crate::RequestQueue::new(self.build_config())
    }
}

impl Default for QueueConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
