//! Core infrastructure for reqflow.
//!
//! This crate provides functionality shared by every reqflow component:
//! - Event system for observability (rate limiter, queue, cache, retry)
//! - The boxed error type used at the seams between components

pub mod error;
pub mod events;

pub use error::{BoxError, ErrorChain};
pub use events::{Event, EventListener, EventListeners, FnListener};
