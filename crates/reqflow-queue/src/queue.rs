//! Queue implementation.

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::events::QueueEvent;
use parking_lot::Mutex;
use pin_project_lite::pin_project;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::oneshot;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge, histogram};

#[cfg(feature = "tracing")]
use tracing::debug;

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Job = Box<dyn FnOnce() -> JobFuture + Send>;

/// A task waiting for a slot.
struct Pending {
    /// Effective priority; lower runs first.
    rank: i64,
    seq: u64,
    enqueued_at: Instant,
    job: Job,
}

impl Pending {
    fn key(&self) -> (i64, u64) {
        (self.rank, self.seq)
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // BinaryHeap pops the greatest element, so the smallest key compares greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

#[derive(Default)]
struct State {
    active: usize,
    pending: BinaryHeap<Pending>,
    next_seq: u64,
}

struct Shared {
    state: Mutex<State>,
    config: QueueConfig,
}

/// Bounded-concurrency task queue with optional priority ordering.
///
/// Operations are spawned onto the current Tokio runtime when a slot frees
/// up, so [`RequestQueue::submit`] must be called from within a runtime.
/// Cloning is cheap; clones share slots and pending tasks.
#[derive(Clone)]
pub struct RequestQueue {
    shared: Arc<Shared>,
}

impl RequestQueue {
    /// Creates a new queue.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                config,
            }),
        }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> crate::QueueConfigBuilder {
        crate::QueueConfigBuilder::new()
    }

    /// Submits an operation and returns a handle to its result.
    ///
    /// The operation starts as soon as a slot is free and no
    /// higher-precedence task is waiting. Dropping the handle does not
    /// cancel the operation.
    pub fn submit<F, Fut, T>(&self, operation: F, priority: Option<i64>) -> QueueHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || -> JobFuture {
            Box::pin(async move {
                let output = operation().await;
                let _ = tx.send(output);
            })
        });

        let config = &self.shared.config;
        let rank = if config.enable_priority {
            priority.unwrap_or(i64::MAX)
        } else {
            0
        };

        let pending = {
            let mut state = self.shared.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(Pending {
                rank,
                seq,
                enqueued_at: Instant::now(),
                job,
            });
            state.pending.len()
        };

        config.event_listeners.emit(&QueueEvent::TaskQueued {
            component_name: config.name.clone(),
            timestamp: Instant::now(),
            priority,
            pending,
        });

        #[cfg(feature = "metrics")]
        gauge!("queue_pending_tasks", "queue" => config.name.clone()).set(pending as f64);

        #[cfg(feature = "tracing")]
        debug!(queue = %config.name, ?priority, pending, "task queued");

        dispatch(&self.shared);

        QueueHandle { rx }
    }

    /// Returns the number of tasks waiting for a slot.
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Returns the number of tasks currently running.
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Returns the configured concurrency bound.
    pub fn max_concurrency(&self) -> usize {
        self.shared.config.max_concurrency
    }

    /// Returns whether priority ordering is enabled.
    pub fn priority_enabled(&self) -> bool {
        self.shared.config.enable_priority
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("RequestQueue")
            .field("name", &self.shared.config.name)
            .field("max_concurrency", &self.shared.config.max_concurrency)
            .field("active", &state.active)
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Starts pending tasks while slots are free.
fn dispatch(shared: &Arc<Shared>) {
    let config = &shared.config;

    loop {
        let (task, active) = {
            let mut state = shared.state.lock();
            if state.active >= config.max_concurrency {
                return;
            }
            let Some(task) = state.pending.pop() else {
                return;
            };
            state.active += 1;
            (task, state.active)
        };

        let waited = task.enqueued_at.elapsed();
        config.event_listeners.emit(&QueueEvent::TaskStarted {
            component_name: config.name.clone(),
            timestamp: Instant::now(),
            active,
            waited,
        });

        #[cfg(feature = "metrics")]
        {
            gauge!("queue_active_tasks", "queue" => config.name.clone()).set(active as f64);
            histogram!("queue_wait_duration_seconds", "queue" => config.name.clone())
                .record(waited.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        debug!(queue = %config.name, active, ?waited, "task started");

        let slot = ActiveSlot {
            shared: Arc::clone(shared),
            started_at: Instant::now(),
        };
        let job = task.job;
        tokio::spawn(async move {
            let _slot = slot;
            job().await;
        });
    }
}

/// Holds one concurrency slot for the lifetime of a running task.
///
/// Released on drop, which also covers panics and runtime shutdown.
struct ActiveSlot {
    shared: Arc<Shared>,
    started_at: Instant,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        let config = &self.shared.config;
        {
            let mut state = self.shared.state.lock();
            state.active = state.active.saturating_sub(1);
        }

        let duration = self.started_at.elapsed();
        config.event_listeners.emit(&QueueEvent::TaskFinished {
            component_name: config.name.clone(),
            timestamp: Instant::now(),
            duration,
        });

        #[cfg(feature = "metrics")]
        counter!("queue_tasks_finished_total", "queue" => config.name.clone()).increment(1);

        if tokio::runtime::Handle::try_current().is_ok() {
            dispatch(&self.shared);
        }
    }
}

pin_project! {
    /// Handle to the result of a queued operation.
    ///
    /// Resolves to the operation's output, or [`QueueError::TaskFailed`] if
    /// the task ended without producing one.
    #[derive(Debug)]
    #[must_use = "the handle yields the operation's result"]
    pub struct QueueHandle<T> {
        #[pin]
        rx: oneshot::Receiver<T>,
    }
}

impl<T> Future for QueueHandle<T> {
    type Output = Result<T, QueueError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.rx.poll(cx) {
            Poll::Ready(Ok(output)) => Poll::Ready(Ok(output)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(QueueError::TaskFailed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
