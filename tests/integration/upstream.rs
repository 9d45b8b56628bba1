//! Integration tests for the tagging API client

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tourlytics::error::FetchError;
use tourlytics::models::time::{DateRange, Granularity};
use tourlytics::services::cache::{CachedSeriesProvider, ManualClock};
use tourlytics::services::upstream::{SeriesProvider, SeriesQuery, TaggingApiClient};
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query() -> SeriesQuery {
    SeriesQuery::new(
        "root.playas *.*",
        DateRange::parse("2025-09-19", "2025-09-20").unwrap(),
        Granularity::Day,
    )
}

fn client(server: &MockServer) -> TaggingApiClient {
    let endpoint = Url::parse(&format!("{}/tags/series", server.uri())).unwrap();
    TaggingApiClient::new(endpoint)
}

fn ok_body() -> serde_json::Value {
    json!({"output": {"root.playas.lepe": [{"time": "20250919", "value": 3}]}})
}

#[tokio::test]
async fn sends_pattern_window_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tags/series"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({
            "id": "root.playas *.*",
            "startTime": "20250919",
            "endTime": "20250920",
            "granularity": "d"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let series = client(&server)
        .with_token(Some("secret".to_string()))
        .fetch_series(&query())
        .await
        .expect("fetch succeeds");

    assert_eq!(series["root.playas.lepe"][0].value, 3.0);
    server.verify().await;
}

#[tokio::test]
async fn retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(&server)
        .await;

    let series = client(&server)
        .with_max_retries(2)
        .fetch_series(&query())
        .await
        .expect("second attempt succeeds");
    assert_eq!(series.len(), 1);

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).fetch_series(&query()).await.unwrap_err();
    assert!(matches!(err, FetchError::Http(404)));
    server.verify().await;
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_series(&query()).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn cached_provider_serves_repeats_until_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let cached = CachedSeriesProvider::new(
        Arc::new(client(&server)),
        Duration::from_secs(60),
        16,
        clock.clone(),
    );

    cached.fetch_series(&query()).await.unwrap();
    cached.fetch_series(&query()).await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    clock.advance(Duration::from_secs(61));
    cached.fetch_series(&query()).await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(cached.cached_entries().await, 1);
}
