//! HTTP surface tests, driven in-process via `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use lumly_core::{CustomerId, KvStore, LimitConfig, MarkerStore, MemoryStore};
use lumly_integration_tests::{FlakyStore, TEST_SWEEP_SECRET, memory_state, test_state};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn consume_request(customer_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/usage/consume")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!("{{\"customerId\":\"{customer_id}\"}}")))
        .unwrap()
}

fn authed(request: Request<Body>) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        format!("Bearer {TEST_SWEEP_SECRET}").parse().unwrap(),
    );
    Request::from_parts(parts, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn setup() -> (Arc<dyn KvStore>, Router) {
    let (store, state) = memory_state(LimitConfig::default());
    (store as Arc<dyn KvStore>, lumly_server::app(state))
}

#[tokio::test]
async fn health_endpoints() {
    let (_, app) = setup();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn consume_within_quota_returns_counts() {
    let (_, app) = setup();

    let response = app.oneshot(consume_request("c1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["rateLimited"], false);
    assert_eq!(body["used"], 1);
    assert_eq!(body["limit"], 4);
}

#[tokio::test]
async fn consume_past_quota_returns_429_with_detail() {
    let (_, app) = setup();

    for _ in 0..4 {
        let response = app.clone().oneshot(consume_request("c1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(consume_request("c1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let body = body_json(response).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["rateLimited"], true);
    assert_eq!(body["used"], 4);
    assert_eq!(body["limit"], 4);
    assert!(body["elapsedMs"].is_i64());
}

#[tokio::test]
async fn consume_store_failure_is_503_not_zero_usage() {
    // A store failure on the request path is a hard failure; it must
    // never read as "0 of quota used".
    let inner = Arc::new(MemoryStore::new());
    inner.set("generations:c1", "3").await.unwrap();

    let flaky: Arc<dyn KvStore> = Arc::new(FlakyStore::new(
        Arc::clone(&inner) as Arc<dyn KvStore>,
        ["limit-reached:c1".to_string()],
    ));
    let app = lumly_server::app(test_state(flaky, LimitConfig::default()));

    let response = app.oneshot(consume_request("c1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Storage unavailable");

    // The failed request must not have counted
    assert_eq!(inner.get("generations:c1").await.unwrap().as_deref(), Some("3"));
}

#[tokio::test]
async fn consume_rejects_blank_customer() {
    let (_, app) = setup();

    let response = app.oneshot(consume_request("  ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn usage_status_reads_without_counting() {
    let (_, app) = setup();

    app.clone().oneshot(consume_request("c1")).await.unwrap();

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/api/usage/c1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["used"], 1);
    }

    // Unknown customers read as zero of quota
    let response = app.oneshot(get("/api/usage/unknown")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["used"], 0);
    assert_eq!(body["allowed"], true);
}

#[tokio::test]
async fn queue_endpoints_require_bearer_secret() {
    let (_, app) = setup();

    for request in [
        post("/api/queue/sweep"),
        get("/api/queue"),
        post("/api/queue/c1/reset"),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Wrong secret is also rejected
    let mut request = post("/api/queue/sweep");
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer wrong-secret".parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sweep_resets_elapsed_customers() {
    let (store, app) = setup();

    // Back-date a marker past the cooldown window
    let markers = MarkerStore::new(Arc::clone(&store));
    markers
        .mark_reached(
            &CustomerId::new("c1"),
            4,
            4,
            Utc::now() - Duration::minutes(65),
        )
        .await
        .unwrap();
    store.set("generations:c1", "4").await.unwrap();

    let response = app
        .clone()
        .oneshot(authed(post("/api/queue/sweep")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["checked"], 1);
    assert_eq!(body["reset"], 1);
    assert_eq!(body["failed"], 0);

    assert_eq!(store.get("limit-reached:c1").await.unwrap(), None);
    assert_eq!(store.get("generations:c1").await.unwrap().as_deref(), Some("0"));
}

#[tokio::test]
async fn queue_report_shape() {
    let (store, app) = setup();

    let markers = MarkerStore::new(Arc::clone(&store));
    markers
        .mark_reached(
            &CustomerId::new("waiting"),
            4,
            4,
            Utc::now() - Duration::minutes(10),
        )
        .await
        .unwrap();
    markers
        .mark_reached(
            &CustomerId::new("ready"),
            4,
            4,
            Utc::now() - Duration::minutes(90),
        )
        .await
        .unwrap();

    let response = app.oneshot(authed(get("/api/queue"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["queueLength"], 2);
    assert_eq!(body["readyForReset"], 1);
    assert_eq!(body["waitingCount"], 1);
    assert_eq!(body["malformed"], 0);

    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Oldest first
    assert_eq!(entries[0]["customerId"], "ready");
    assert_eq!(entries[0]["readyForReset"], true);
    assert_eq!(entries[1]["customerId"], "waiting");
    assert_eq!(entries[1]["readyForReset"], false);
    assert!(entries[1]["elapsedMs"].as_i64().unwrap() >= 600_000);
}

#[tokio::test]
async fn manual_reset_clears_customer() {
    let (store, app) = setup();

    for _ in 0..4 {
        app.clone().oneshot(consume_request("c1")).await.unwrap();
    }
    assert!(store.get("limit-reached:c1").await.unwrap().is_some());

    let response = app
        .clone()
        .oneshot(authed(post("/api/queue/c1/reset")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reset"], true);
    assert_eq!(body["customerId"], "c1");

    // The customer can generate again immediately
    let response = app.oneshot(consume_request("c1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["used"], 1);
}
