//! Client-side request orchestration.
//!
//! A [`Client`] sits between application code and a transport and runs
//! every request through the same pipeline:
//!
//! 1. pre-send hooks
//! 2. token-bucket admission ([`reqflow_ratelimiter`])
//! 3. cache lookup with stale-while-revalidate ([`reqflow_cache`])
//! 4. bounded-concurrency, optionally prioritized execution ([`reqflow_queue`])
//! 5. retry with exponential backoff and jitter ([`reqflow_retry`])
//! 6. cache population and post-receive hooks
//!
//! The transport is any cloneable [`tower::Service`] from [`Request`] to
//! [`Response`] that fails with [`TransportError`]. `Client` is itself a
//! `tower::Service<Request>`.
//!
//! # Example
//!
//! ```
//! use reqflow::{Client, Request, Response, TransportError};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), reqflow::Error> {
//! let client = Client::builder()
//!     .max_requests_per_second(20.0)
//!     .max_concurrency(4)
//!     .build(tower::service_fn(|request: Request| async move {
//!         Ok::<_, TransportError>(Response::new(&request, 200).with_body("[]"))
//!     }));
//!
//! client.register_pre_send_hook(|request: Request| async move {
//!     Ok::<_, std::convert::Infallible>(request.with_header("authorization", "Bearer token"))
//! });
//!
//! let response = client
//!     .submit(
//!         Request::get("https://api.example.com/users")
//!             .cached_for(Duration::from_secs(30))
//!             .with_max_retries(3),
//!     )
//!     .await?;
//! assert!(response.ok());
//! # Ok(())
//! # }
//! ```
//!
//! # Cached responses
//!
//! A request with caching enabled is answered from the cache while its
//! entry is fresh. For a while after expiry (the stale window) the old
//! response is still returned immediately and one background revalidation
//! replays the request through the limiter, queue and retry loop. Only one
//! revalidation runs per key at a time; a failed one leaves the stale entry
//! in place.
//!
//! # Errors
//!
//! Every failure is an [`Error`]. Network errors, timeouts and 5xx
//! responses are retried up to the request's `max_retries`, after which
//! [`Error::RetryLimitExceeded`] is returned with the final failure as its
//! source. Everything else, including rate limiting and hook failures,
//! surfaces immediately.

mod client;
mod config;
mod error;
mod key;
mod middleware;
mod request;
mod response;
mod transport;

pub use client::Client;
pub use config::{ClientBuilder, ClientSettings};
pub use error::Error;
pub use key::{CacheKeyMode, RequestKey};
pub use middleware::{PostReceiveHook, PreSendHook};
pub use request::{Body, CachePolicy, Method, Request, UnknownMethod, DEFAULT_TIMEOUT};
pub use response::Response;
pub use transport::TransportError;

pub use reqflow_core::BoxError;

pub use reqflow_cache as cache;
pub use reqflow_queue as queue;
pub use reqflow_ratelimiter as ratelimiter;
pub use reqflow_retry as retry;
