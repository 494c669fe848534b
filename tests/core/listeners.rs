//! Listeners registered through the client builder observe the pipeline.

use reqflow::{Client, Request, Response, TransportError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Counters {
    permits: AtomicUsize,
    rejections: AtomicUsize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    started: AtomicUsize,
    retries: AtomicUsize,
}

#[tokio::test(start_paused = true)]
async fn events_follow_the_request_lifecycle() {
    let counters = Arc::new(Counters::default());
    let statuses = Arc::new(Mutex::new(vec![503u16, 200]));

    let transport = {
        let statuses = Arc::clone(&statuses);
        tower::service_fn(move |request: Request| {
            let status = {
                let mut statuses = statuses.lock().unwrap();
                if statuses.is_empty() {
                    200
                } else {
                    statuses.remove(0)
                }
            };
            async move { Ok::<_, TransportError>(Response::new(&request, status)) }
        })
    };

    let c = Arc::clone(&counters);
    let client = Client::builder()
        .name("events")
        .max_requests_per_second(0.001)
        .burst_capacity(2.0)
        .configure_rate_limiter({
            let c = Arc::clone(&c);
            move |limiter| {
                let rejected = Arc::clone(&c);
                limiter
                    .on_permit_acquired(move |_| {
                        c.permits.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_permit_rejected(move |_| {
                        rejected.rejections.fetch_add(1, Ordering::SeqCst);
                    })
            }
        })
        .configure_cache({
            let c = Arc::clone(&c);
            move |cache| {
                let missed = Arc::clone(&c);
                cache
                    .on_hit(move || {
                        c.hits.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_miss(move || {
                        missed.misses.fetch_add(1, Ordering::SeqCst);
                    })
            }
        })
        .configure_queue({
            let c = Arc::clone(&c);
            move |queue| {
                queue.on_task_started(move |_, _| {
                    c.started.fetch_add(1, Ordering::SeqCst);
                })
            }
        })
        .configure_retry(move |retry| {
            retry.on_retry(move |_, _| {
                c.retries.fetch_add(1, Ordering::SeqCst);
            })
        })
        .build(transport);

    let request = Request::get("https://example.com/a")
        .cached_for(Duration::from_secs(60))
        .with_max_retries(1);
    client.submit(request.clone()).await.unwrap();
    client.submit(request.clone()).await.unwrap();
    assert!(client.submit(request).await.unwrap_err().is_rate_limited());

    assert_eq!(counters.permits.load(Ordering::SeqCst), 2);
    assert_eq!(counters.rejections.load(Ordering::SeqCst), 1);
    assert_eq!(counters.misses.load(Ordering::SeqCst), 1);
    assert_eq!(counters.hits.load(Ordering::SeqCst), 1);
    assert_eq!(counters.started.load(Ordering::SeqCst), 2);
    assert_eq!(counters.retries.load(Ordering::SeqCst), 1);
}
