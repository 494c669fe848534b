//! Single-flight refresh under contention.

use super::counting_transport;
use reqflow::{Client, Request};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn one_refresh_for_many_stale_readers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let client = Client::builder()
        .max_requests_per_second(1000.0)
        .stale_window(Duration::from_secs(10))
        .build(counting_transport(Arc::clone(&calls), Duration::from_millis(100)));

    let request = Request::get("https://example.com/feed").cached_for(Duration::from_millis(50));
    client.submit(request.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let client = client.clone();
            let request = request.clone();
            tokio::spawn(async move { client.submit(request).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.body.as_deref(), Some("call 1"));
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(client.cache().in_flight_refreshes(), 0);

    let fresh = client.submit(request).await.unwrap();
    assert_eq!(fresh.body.as_deref(), Some("call 2"));
}
