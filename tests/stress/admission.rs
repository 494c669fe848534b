//! Token accounting under contention.

use super::counting_transport;
use reqflow::{Client, Error, Request};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn exactly_burst_requests_admitted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let client = Client::builder()
        .max_requests_per_second(0.001)
        .burst_capacity(50.0)
        .max_concurrency(16)
        .build(counting_transport(Arc::clone(&calls), Duration::from_millis(1)));

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .submit(Request::get(format!("https://example.com/{i}")))
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(Error::RateLimitExceeded { .. }) => denied += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(admitted, 50);
    assert_eq!(denied, 150);
    assert_eq!(calls.load(Ordering::SeqCst), 50);
    assert!(client.rate_limiter().available_tokens() < 1.0);
}
