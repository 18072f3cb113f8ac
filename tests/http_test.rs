// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP surface tests.

use action_guard::{
    clock::{Clock, ManualClock},
    config::{Config, PolicyConfig},
    handlers::{prune, router, AppState},
    storage::{FileStorage, MemoryStorage, Storage},
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(clock: Arc<ManualClock>) -> Router {
    let mut config = Config::default();
    config.ids.salt = "this is my salt".to_string();
    config.policies.insert(
        "comment".to_string(),
        PolicyConfig {
            window_ms: 10_000,
            max_calls: 1,
        },
    );
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let clock: Arc<dyn Clock> = clock;
    router(Arc::new(AppState::new(config, storage, clock).unwrap()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn admit(body: Value) -> Request<Body> {
    Request::post("/admit")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(Arc::new(ManualClock::new(0)));
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_admit_then_deny() {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let app = app(clock.clone());

    let (status, body) = send(&app, admit(json!({"action": "comment"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);
    assert_eq!(body["remaining"], 0);

    clock.advance(3_000);
    let (status, body) = send(&app, admit(json!({"action": "comment"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["retry_after_ms"], 7_000);
    assert_eq!(body["retry_after_secs"], 7);
    assert_eq!(body["message"], "Please wait 7 seconds before trying again.");

    clock.advance(7_000);
    let (_, body) = send(&app, admit(json!({"action": "comment", "lang": "bn"}))).await;
    assert_eq!(body["allowed"], true);
}

#[tokio::test]
async fn test_unknown_and_invalid_actions() {
    let app = app(Arc::new(ManualClock::new(0)));

    let (status, body) = send(&app, admit(json!({"action": "bookmark"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "UNKNOWN_ACTION");

    let (status, body) = send(&app, admit(json!({"action": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ACTION");
}

#[tokio::test]
async fn test_id_routes() {
    let app = app(Arc::new(ManualClock::new(0)));

    let (status, body) = send(&app, Request::get("/ids/encode/1").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hash"], "gB0NV05e");

    let (status, body) =
        send(&app, Request::get("/ids/decode/gB0NV05e").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);

    let (status, body) =
        send(&app, Request::get("/ids/decode/zzzz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ID");
}

#[tokio::test]
async fn test_metrics_counts_decisions() {
    let app = app(Arc::new(ManualClock::new(0)));
    send(&app, admit(json!({"action": "comment"}))).await;
    send(&app, admit(json!({"action": "comment"}))).await;

    let response = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"outcome="allowed"} 1"#));
    assert!(text.contains(r#"outcome="denied"} 1"#));
}

#[tokio::test]
async fn test_file_backed_admission() {
    let path = std::env::temp_dir().join(format!("action-guard-http-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut config = Config::default();
    config.policies.insert(
        "comment".to_string(),
        PolicyConfig {
            window_ms: 10_000,
            max_calls: 1,
        },
    );
    let clock = Arc::new(ManualClock::new(50_000));
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&path));
    let state = Arc::new(AppState::new(config, storage, clock.clone()).unwrap());
    let app = router(state.clone());

    let (_, body) = send(&app, admit(json!({"action": "comment"}))).await;
    assert_eq!(body["allowed"], true);
    let (_, body) = send(&app, admit(json!({"action": "comment"}))).await;
    assert_eq!(body["allowed"], false);

    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["rate_limit_comment_history"], "[50000]");

    clock.advance(10_000);
    assert_eq!(prune(state).await, 1);
    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["rate_limit_comment_history"], "[]");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_bad_service_config_rejected() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));

    let mut config = Config::default();
    config.metrics.path = "metrics".to_string();
    assert!(AppState::new(config, storage.clone(), clock.clone()).is_err());

    let mut config = Config::default();
    config.storage.prune_interval_secs = 0;
    assert!(AppState::new(config, storage, clock).is_err());
}
