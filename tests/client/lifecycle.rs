//! Admission, validation and the happy path.

use super::test_utils::MockTransport;
use reqflow::{Client, Error, Method, Request};
use std::time::Duration;
use tower::{Service, ServiceExt};

#[tokio::test]
async fn successful_request_reaches_transport_once() {
    let transport = MockTransport::ok();
    let client = Client::builder().build(transport.clone());

    let response = client
        .submit(Request::get("https://api.example.com/users"))
        .await
        .unwrap();

    assert!(response.ok());
    assert_eq!(response.status, 200);
    assert_eq!(response.method, Method::Get);
    assert_eq!(response.target, "https://api.example.com/users");
    assert_eq!(response.body.as_deref(), Some("call 1"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn headers_and_body_are_forwarded() {
    let transport = MockTransport::ok();
    let client = Client::builder().build(transport.clone());

    let method: Method = "patch".parse().unwrap();
    client
        .submit(
            Request::new(method, "https://api.example.com/users/7")
                .with_header("content-type", "application/json")
                .with_body(r#"{"name":"ada"}"#),
        )
        .await
        .unwrap();

    let seen = transport.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method(), Method::Patch);
    assert_eq!(
        seen[0].headers().get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert!(seen[0].body().is_some());
}

#[tokio::test]
async fn empty_target_is_rejected_without_a_token() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .max_requests_per_second(1.0)
        .build(transport.clone());

    let err = client.submit(Request::get("   ")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    client.submit(Request::get("https://example.com")).await.unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn denial_is_immediate_and_terminal() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .max_requests_per_second(1.0)
        .burst_capacity(2.0)
        .build(transport.clone());

    client.submit(Request::get("https://example.com/a")).await.unwrap();
    client.submit(Request::get("https://example.com/b")).await.unwrap();

    let err = client
        .submit(Request::get("https://example.com/c").with_max_retries(5))
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert!(!err.is_retry_eligible());
    match err {
        Error::RateLimitExceeded { retry_after } => {
            let retry_after = retry_after.unwrap().as_secs_f64();
            assert!((retry_after - 1.0).abs() < 1e-6);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn tokens_refill_over_time() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .max_requests_per_second(2.0)
        .burst_capacity(1.0)
        .build(transport.clone());

    client.submit(Request::get("https://example.com")).await.unwrap();
    assert!(client.submit(Request::get("https://example.com")).await.is_err());

    tokio::time::advance(Duration::from_millis(600)).await;
    client.submit(Request::get("https://example.com")).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn cache_hits_still_consume_tokens() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .max_requests_per_second(1.0)
        .burst_capacity(2.0)
        .build(transport.clone());

    let request = Request::get("https://example.com/config").cached();
    client.submit(request.clone()).await.unwrap();
    client.submit(request.clone()).await.unwrap();

    let err = client.submit(request).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn client_is_a_tower_service() {
    let transport = MockTransport::status(202);
    let mut client = Client::builder().build(transport.clone());

    let response = client
        .ready()
        .await
        .unwrap()
        .call(Request::delete("https://example.com/jobs/1"))
        .await
        .unwrap();
    assert_eq!(response.status, 202);

    let response = client
        .clone()
        .oneshot(Request::put("https://example.com/jobs/1"))
        .await
        .unwrap();
    assert_eq!(response.status, 202);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn clones_share_components() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .max_requests_per_second(0.001)
        .burst_capacity(1.0)
        .build(transport.clone());
    let clone = client.clone();

    client.submit(Request::get("https://example.com")).await.unwrap();
    let err = clone.submit(Request::get("https://example.com")).await.unwrap_err();

    assert!(err.is_rate_limited());
}
