//! Error types for the request queue.

/// Errors delivered through a [`QueueHandle`](crate::QueueHandle).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The task ended without producing a result, e.g. because its
    /// operation panicked or the runtime shut down.
    #[error("queued task failed before producing a result")]
    TaskFailed,
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
