//! Prioritized bounded-concurrency task queue.
//!
//! At most `max_concurrency` submitted operations run at once; the rest wait
//! in the queue. With priority enabled the waiting task with the lowest
//! priority number is dispatched first (tasks without a priority go last,
//! ties keep submission order). Every submission and every completion
//! re-runs dispatch, so a free slot is never left idle while work waits.
//!
//! # Example
//!
//! ```rust
//! use reqflow_queue::QueueConfig;
//!
//! # async fn example() {
//! let queue = QueueConfig::builder()
//!     .max_concurrency(4)
//!     .enable_priority(true)
//!     .name("outbound")
//!     .build();
//!
//! let urgent = queue.submit(|| async { "urgent" }, Some(0));
//! let background = queue.submit(|| async { "background" }, None);
//!
//! assert_eq!(urgent.await.unwrap(), "urgent");
//! assert_eq!(background.await.unwrap(), "background");
//! # }
//! ```
//!
//! # Failure Isolation
//!
//! A task that panics only fails its own [`QueueHandle`], which resolves to
//! [`QueueError::TaskFailed`]; its slot is released and other tasks keep
//! running.

pub mod config;
pub mod error;
pub mod events;
mod queue;

pub use config::{QueueConfig, QueueConfigBuilder};
pub use error::{QueueError, Result};
pub use events::QueueEvent;
pub use queue::{QueueHandle, RequestQueue};
