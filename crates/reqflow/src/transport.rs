//! The seam between the client and the network.

use crate::request::Request;
use crate::response::Response;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tower::{Service, ServiceExt};

/// Failure reported by a transport before a response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),
    /// The transport gave up waiting on its own.
    #[error("transport timed out")]
    Timeout,
}

/// Type-erased transport held by the client.
pub(crate) type BoxTransport =
    Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Response, TransportError>> + Send + Sync>;

/// Erases a transport service.
///
/// Any cloneable [`tower::Service`] from [`Request`] to [`Response`] failing
/// with [`TransportError`] is a transport, including `tower::service_fn`
/// closures. Each call drives a fresh clone to readiness.
pub(crate) fn boxed<S>(service: S) -> BoxTransport
where
    S: Service<Request, Response = Response, Error = TransportError> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response, TransportError>> {
        service.clone().oneshot(request).boxed()
    })
}
