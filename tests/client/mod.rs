//! Client pipeline tests.
//!
//! Test organization:
//! - lifecycle.rs: admission, validation and the happy path
//! - retry.rs: retry eligibility, exhaustion and backoff
//! - caching.rs: cache hits, stale-while-revalidate and eviction
//! - middleware.rs: pre-send and post-receive hooks
//! - scheduling.rs: concurrency bound and priority dispatch
//! - settings.rs: building clients from serialized settings

mod lifecycle;
mod middleware;
mod retry;
mod settings;
mod test_utils;
