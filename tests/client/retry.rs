//! Retry eligibility, exhaustion and backoff through the client.

use super::test_utils::{MockTransport, Outcome};
use reqflow::{Client, Error, Request};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn three_unavailable() -> MockTransport {
    MockTransport::scripted(
        [Outcome::Status(503), Outcome::Status(503), Outcome::Status(503)],
        Outcome::Status(200),
    )
}

#[tokio::test(start_paused = true)]
async fn succeeds_when_retries_cover_the_failures() {
    let transport = three_unavailable();
    let client = Client::builder().build(transport.clone());

    let response = client
        .submit(Request::get("https://example.com").with_max_retries(3))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body.as_deref(), Some("call 4"));
    assert_eq!(transport.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_is_a_distinct_error() {
    let transport = three_unavailable();
    let client = Client::builder().build(transport.clone());

    let err = client
        .submit(Request::get("https://example.com").with_max_retries(2))
        .await
        .unwrap_err();

    match &err {
        Error::RetryLimitExceeded { attempts, source } => {
            assert_eq!(*attempts, 3);
            assert!(matches!(**source, Error::Http { status: 503, .. }));
        }
        other => panic!("expected retry exhaustion, got {other:?}"),
    }
    assert_eq!(err.status(), Some(503));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
    let transport = MockTransport::status(404);
    let client = Client::builder().build(transport.clone());

    let err = client
        .submit(Request::get("https://example.com/missing").with_max_retries(3))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http { status: 404, .. }));
    assert_eq!(err.response().map(|r| r.target.as_str()), Some("https://example.com/missing"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn network_failures_are_retried() {
    let transport = MockTransport::scripted([Outcome::Network, Outcome::Network], Outcome::Status(200));
    let client = Client::builder().build(transport.clone());

    let response = client
        .submit(Request::get("https://example.com").with_max_retries(2))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_retried_then_reported() {
    let transport = MockTransport::scripted([], Outcome::Hang);
    let client = Client::builder().build(transport.clone());

    let err = client
        .submit(
            Request::get("https://example.com/slow")
                .with_timeout(Duration::from_millis(100))
                .with_max_retries(2),
        )
        .await
        .unwrap_err();

    match err {
        Error::RetryLimitExceeded { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, Error::Timeout { after } if after == Duration::from_millis(100)));
        }
        other => panic!("expected retry exhaustion, got {other:?}"),
    }
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn server_error_without_retries_is_exhaustion() {
    let transport = MockTransport::status(500);
    let client = Client::builder().build(transport.clone());

    let err = client.submit(Request::get("https://example.com")).await.unwrap_err();

    assert!(matches!(err, Error::RetryLimitExceeded { attempts: 1, .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn default_backoff_grows_exponentially() {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&delays);

    let transport = three_unavailable();
    let client = Client::builder()
        .configure_retry(move |retry| {
            retry.on_retry(move |_, delay| recorded.lock().unwrap().push(delay))
        })
        .build(transport.clone());

    client
        .submit(Request::get("https://example.com").with_max_retries(3))
        .await
        .unwrap();

    let delays = delays.lock().unwrap().clone();
    assert_eq!(delays.len(), 3);
    for (attempt, delay) in delays.iter().enumerate() {
        let base = Duration::from_millis(100 * 2u64.pow(attempt as u32));
        assert!(*delay >= base, "retry {} waited {:?}", attempt, delay);
        assert!(*delay < base + Duration::from_millis(50), "retry {} waited {:?}", attempt, delay);
    }
}

#[tokio::test(start_paused = true)]
async fn backoff_settings_shape_the_wait() {
    let transport = three_unavailable();
    let client = Client::builder()
        .backoff_base(Duration::from_secs(1))
        .backoff_max(Duration::from_millis(1500))
        .backoff_jitter(Duration::ZERO)
        .build(transport.clone());

    let start = Instant::now();
    client
        .submit(Request::get("https://example.com").with_max_retries(3))
        .await
        .unwrap();

    // 1s, then 2s and 4s capped at 1.5s
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(4000), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(4100), "waited {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn retries_do_not_consume_tokens() {
    let transport = three_unavailable();
    let client = Client::builder()
        .max_requests_per_second(0.001)
        .burst_capacity(1.0)
        .build(transport.clone());

    client
        .submit(Request::get("https://example.com").with_max_retries(3))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn every_attempt_reenters_the_queue() {
    let queued = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&queued);

    let transport = three_unavailable();
    let client = Client::builder()
        .configure_queue(move |queue| {
            queue.on_task_queued(move |_| *counter.lock().unwrap() += 1)
        })
        .build(transport.clone());

    client
        .submit(Request::get("https://example.com").with_max_retries(3))
        .await
        .unwrap();

    assert_eq!(*queued.lock().unwrap(), 4);
}
