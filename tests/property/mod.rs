//! Property-based tests for the reqflow components.
//!
//! Run with: cargo test --test property_tests

pub mod rate_limiter;

use tokio::runtime::Runtime;

/// Single-threaded runtime whose clock only moves when advanced.
pub fn paused_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}
