//! Pre-send and post-receive hooks.

use super::test_utils::{MockTransport, Outcome};
use reqflow::{BoxError, Client, Error, Request, Response};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn pre_send_hooks_run_in_registration_order() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .pre_send_hook(|request: Request| async move {
            Ok::<_, BoxError>(request.with_header("x-order", "builder"))
        })
        .build(transport.clone());

    client.register_pre_send_hook(|request: Request| async move {
        let previous = request.headers().get("x-order").cloned().unwrap_or_default();
        Ok::<_, BoxError>(request.with_header("x-order", format!("{previous},first")))
    });
    client.register_pre_send_hook(|request: Request| async move {
        let target = format!("{}?v=2", request.target());
        let previous = request.headers().get("x-order").cloned().unwrap_or_default();
        Ok::<_, BoxError>(
            request
                .with_target(target)
                .with_header("x-order", format!("{previous},second")),
        )
    });

    client.submit(Request::get("https://example.com/users")).await.unwrap();

    let seen = transport.requests();
    assert_eq!(seen[0].target(), "https://example.com/users?v=2");
    assert_eq!(
        seen[0].headers().get("x-order").map(String::as_str),
        Some("builder,first,second")
    );
}

#[tokio::test]
async fn pre_send_failure_aborts_before_admission() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .max_requests_per_second(0.001)
        .burst_capacity(1.0)
        .build(transport.clone());

    let armed = Arc::new(AtomicUsize::new(1));
    let remaining = Arc::clone(&armed);
    client.register_pre_send_hook(move |request: Request| {
        let fail = remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        async move {
            if fail {
                Err(BoxError::from("missing credentials"))
            } else {
                Ok(request)
            }
        }
    });

    let err = client
        .submit(Request::get("https://example.com").with_max_retries(3))
        .await
        .unwrap_err();

    match &err {
        Error::Middleware(source) => assert_eq!(source.to_string(), "missing credentials"),
        other => panic!("expected middleware error, got {other:?}"),
    }
    assert!(!err.is_retry_eligible());
    assert_eq!(transport.calls(), 0);

    // the failed request did not spend the only token
    client.submit(Request::get("https://example.com")).await.unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn hook_that_clears_the_target_is_rejected() {
    let transport = MockTransport::ok();
    let client = Client::builder().build(transport.clone());
    client.register_pre_send_hook(|request: Request| async move {
        Ok::<_, BoxError>(request.with_target(""))
    });

    let err = client.submit(Request::get("https://example.com")).await.unwrap_err();

    assert!(matches!(err, Error::InvalidRequest(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn post_receive_hooks_transform_responses() {
    let transport = MockTransport::ok();
    let client = Client::builder()
        .post_receive_hook(|response: Response| async move {
            Ok::<_, BoxError>(response.with_header("x-first", "1"))
        })
        .build(transport.clone());
    client.register_post_receive_hook(|response: Response| async move {
        let body = response.body.clone().map(|b| b.to_uppercase());
        let mut response = response.with_header("x-second", "2");
        response.body = body;
        Ok::<_, BoxError>(response)
    });

    let response = client.submit(Request::get("https://example.com")).await.unwrap();

    assert_eq!(response.headers.get("x-first").map(String::as_str), Some("1"));
    assert_eq!(response.headers.get("x-second").map(String::as_str), Some("2"));
    assert_eq!(response.body.as_deref(), Some("CALL 1"));
}

#[tokio::test]
async fn post_receive_hooks_see_cache_hits() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let transport = MockTransport::ok();
    let client = Client::builder().build(transport.clone());
    client.register_post_receive_hook(move |response: Response| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, BoxError>(response) }
    });

    let request = Request::get("https://example.com/config").cached();
    client.submit(request.clone()).await.unwrap();
    client.submit(request).await.unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn post_receive_failure_propagates_without_retry() {
    let transport = MockTransport::scripted([Outcome::Status(503)], Outcome::Status(200));
    let client = Client::builder().build(transport.clone());
    client.register_post_receive_hook(|response: Response| async move {
        if response.status == 200 {
            Err(BoxError::from("schema mismatch"))
        } else {
            Ok(response)
        }
    });

    let request = Request::get("https://example.com/report")
        .cached()
        .with_max_retries(3);
    let err = client.submit(request.clone()).await.unwrap_err();

    assert!(matches!(err, Error::Middleware(_)));
    // one failed attempt, one success; the hook failure itself is not retried
    assert_eq!(transport.calls(), 2);
    // the response was cached before the hooks ran
    let key = client.cache_key(&request).unwrap();
    assert!(client.cache().contains(&key));
}
