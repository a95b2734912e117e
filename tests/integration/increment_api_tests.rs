//! Increment API integration tests
//!
//! Drive both routers in-process and check what the scrape endpoint reports.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use otelprobe_server::api::{build_increment_router, build_ops_router};
use otelprobe_server::metrics::Telemetry;
use otelprobe_server::{AppState, Config};

struct Harness {
    api: Router,
    ops: Router,
    state: AppState,
}

fn harness() -> Harness {
    let telemetry = Telemetry::pull_only(&Config::default());
    let state = AppState::new(&telemetry);
    Harness {
        api: build_increment_router(state.clone()),
        ops: build_ops_router(state.clone()),
        state,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: &'static str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn scraped_value(rendered: &str, path: &str) -> Option<u64> {
    let prefix = format!("path_increment_sum{{path=\"{path}\"}} ");
    rendered
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .and_then(|v| v.trim().parse().ok())
}

#[tokio::test]
async fn test_one_shot_post_echoes_and_counts() {
    let h = harness();
    let body = r#"{"incrementBy": 7}"#;

    let request = Request::builder()
        .method("POST")
        .uri("/a")
        .body(Body::from(body))
        .unwrap();
    let response = h.api.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let echoed = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&echoed[..], body.as_bytes());

    let (status, rendered) = send(&h.ops, "GET", "/metrics", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scraped_value(&rendered, "/a"), Some(7));
    assert!(h.state.registry().is_empty());
}

#[tokio::test]
async fn test_nested_paths_are_distinct_keys() {
    let h = harness();
    send(&h.api, "POST", "/svc/orders", r#"{"incrementBy": 2}"#).await;
    send(&h.api, "POST", "/svc", r#"{"incrementBy": 5}"#).await;
    send(&h.api, "POST", "/svc/orders", r#"{"incrementBy": 3}"#).await;

    let (_, rendered) = send(&h.ops, "GET", "/metrics", "").await;
    assert_eq!(scraped_value(&rendered, "/svc/orders"), Some(5));
    assert_eq!(scraped_value(&rendered, "/svc"), Some(5));
    assert_eq!(scraped_value(&rendered, "/other"), None);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let h = harness();

    let (status, body) = send(&h.api, "GET", "/a", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["error"], "METHOD_NOT_ALLOWED");

    let (_, rendered) = send(&h.ops, "GET", "/metrics", "").await;
    assert_eq!(scraped_value(&rendered, "/a"), None);
}

#[tokio::test]
async fn test_non_json_is_bad_request() {
    let h = harness();

    let (status, body) = send(&h.api, "POST", "/a", "increment please").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["error"], "BAD_REQUEST");

    let (_, rendered) = send(&h.ops, "GET", "/metrics", "").await;
    assert_eq!(scraped_value(&rendered, "/a"), None);
    assert!(h.state.registry().is_empty());
}

#[tokio::test]
async fn test_periodic_request_is_listed_with_floors() {
    let h = harness();
    let body = r#"{"incrementBy": 1, "incrementByPeriodic": 50, "incrementIntervalSeconds": 2}"#;

    let (status, echoed) = send(&h.api, "POST", "/b", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, body);

    let (status, workers) = send(&h.ops, "GET", "/workers", "").await;
    assert_eq!(status, StatusCode::OK);
    let workers: Value = serde_json::from_str(&workers).unwrap();
    assert_eq!(workers["count"], 1);
    assert_eq!(workers["workers"][0]["path"], "/b");
    assert_eq!(workers["workers"][0]["amount"], 100);
    assert_eq!(workers["workers"][0]["interval_secs"], 10);

    let (_, stats) = send(&h.ops, "GET", "/stats", "").await;
    let stats: Value = serde_json::from_str(&stats).unwrap();
    assert_eq!(stats["requests_total"], 1);
    assert_eq!(stats["periodic_requests"], 1);
    assert_eq!(stats["active_workers"], 1);
}

#[tokio::test]
async fn test_healthz() {
    let h = harness();
    let (status, body) = send(&h.ops, "GET", "/healthz", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_negative_periodic_fields_are_floored() {
    let h = harness();
    let body = r#"{"incrementBy": 1, "incrementByPeriodic": -5}"#;

    let (status, echoed) = send(&h.api, "POST", "/n", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, body);

    let (_, workers) = send(&h.ops, "GET", "/workers", "").await;
    let workers: Value = serde_json::from_str(&workers).unwrap();
    assert_eq!(workers["count"], 1);
    assert_eq!(workers["workers"][0]["path"], "/n");
    assert_eq!(workers["workers"][0]["amount"], 100);
    assert_eq!(workers["workers"][0]["interval_secs"], 10);

    let (_, rendered) = send(&h.ops, "GET", "/metrics", "").await;
    assert!(scraped_value(&rendered, "/n").is_some_and(|v| v >= 1));
}
