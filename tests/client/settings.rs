//! Building clients from serialized settings.

use super::test_utils::MockTransport;
use reqflow::{ClientBuilder, ClientSettings, Request};
use std::time::Duration;

#[tokio::test]
async fn settings_configure_every_component() {
    let settings: ClientSettings = serde_json::from_value(serde_json::json!({
        "maxRequestsPerSecond": 4,
        "burstCapacity": 8,
        "maxConcurrency": 3,
        "enablePriority": true,
        "maxCacheEntries": 1,
        "enableLRU": false,
        "defaultTTL": 2000,
        "staleWindow": 250,
        "enableStaleWhileRevalidate": false,
        "cleanupInterval": 0,
        "cacheKeyMode": "fullRequest"
    }))
    .unwrap();

    let transport = MockTransport::ok();
    let client = ClientBuilder::from_settings(settings)
        .name("settings")
        .build(transport.clone());

    assert_eq!(client.rate_limiter().capacity(), 8.0);
    assert_eq!(client.queue().max_concurrency(), 3);
    assert!(client.queue().priority_enabled());
    assert_eq!(client.cache().default_ttl(), Duration::from_secs(2));

    client.submit(Request::get("https://example.com/a").cached()).await.unwrap();
    client.submit(Request::get("https://example.com/b").cached()).await.unwrap();
    assert_eq!(client.cache().len(), 1);

    let key = client.cache_key(&Request::get("https://example.com/b")).unwrap();
    assert!(key.fingerprint().starts_with('{'));
}

#[test]
fn unknown_cache_key_mode_is_rejected() {
    let result = serde_json::from_str::<ClientSettings>(r#"{ "cacheKeyMode": "byHost" }"#);
    assert!(result.is_err());
}
