//! Panicking listeners never break a request.

use reqflow::{Client, Request, Response, TransportError};
use reqflow_core::{EventListeners, FnListener};
use reqflow_ratelimiter::RateLimiterEvent;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn ok_transport() -> impl tower::Service<
    Request,
    Response = Response,
    Error = TransportError,
    Future = impl std::future::Future<Output = Result<Response, TransportError>> + Send,
> + Clone
       + Send
       + Sync
       + 'static {
    tower::service_fn(|request: Request| async move {
        Ok::<_, TransportError>(Response::new(&request, 200))
    })
}

#[test]
fn later_listeners_still_run() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let mut listeners = EventListeners::new();
    listeners.add(FnListener::new(|_: &RateLimiterEvent| {
        panic!("listener failure");
    }));
    listeners.add(FnListener::new(move |_: &RateLimiterEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    listeners.emit(&RateLimiterEvent::PermitAcquired {
        component_name: "api".into(),
        timestamp: std::time::Instant::now(),
        remaining: 1,
    });

    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn request_succeeds_despite_panicking_listeners() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let client = Client::builder()
        .configure_rate_limiter(|limiter| limiter.on_permit_acquired(|_| panic!("limiter listener")))
        .configure_queue(|queue| queue.on_task_started(|_, _| panic!("queue listener")))
        .configure_retry(|retry| retry.on_success(|_| panic!("retry listener")))
        .configure_cache(|cache| cache.on_miss(|| panic!("cache listener")))
        .build(ok_transport());

    let response = client
        .submit(Request::get("https://example.com").cached())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(client.queue().pending_count(), 0);
}
