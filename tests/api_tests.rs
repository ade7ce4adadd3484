//! First-party API and frontend delivery integration tests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, body_string, test_state};

/// Upstream URLs for tests that never leave the gateway.
const UNUSED_AGENT: &str = "http://127.0.0.1:1";
const UNUSED_PRIMARY: &str = "http://127.0.0.1:1";

/// Health endpoint works without authentication.
#[tokio::test]
async fn test_health_endpoint() {
    let app = tenant_gateway::api::create_router(test_state(UNUSED_AGENT, UNUSED_PRIMARY, None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

/// The /config endpoint serves the frontend configuration with every
/// secret-bearing key stripped, at any nesting depth.
#[tokio::test]
async fn test_config_endpoint_strips_secrets() {
    let state = test_state(UNUSED_AGENT, UNUSED_PRIMARY, None).with_frontend_config(json!({
        "server": {"api_path": "/api", "port": 8080},
        "acapy": {
            "base_url": "http://agent:8031",
            "mount": "/api/acapy",
            "token": "super-secret",
        },
        "ui": {"app_title": "Tenant UI"},
    }));
    let app = tenant_gateway::api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/config")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["acapy"]["mount"], "/api/acapy");
    assert_eq!(json["ui"]["app_title"], "Tenant UI");
    assert!(json["acapy"].get("token").is_none());
    assert!(!body_string_contains(&json, "super-secret"));
}

fn body_string_contains(value: &serde_json::Value, needle: &str) -> bool {
    value.to_string().contains(needle)
}

/// Without a static directory, unmatched paths are a structured 404.
#[tokio::test]
async fn test_unmatched_path_without_static_dir_is_404() {
    let app = tenant_gateway::api::create_router(test_state(UNUSED_AGENT, UNUSED_PRIMARY, None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tenants/42")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

/// With a static directory, assets are served directly and unknown paths
/// fall back to index.html so client-side routing survives a refresh.
#[tokio::test]
async fn test_static_assets_and_history_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>tenant ui</html>").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), "console.log('ui');").unwrap();

    let state =
        test_state(UNUSED_AGENT, UNUSED_PRIMARY, None).with_static_dir(dir.path());
    let app = tenant_gateway::api::create_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/assets/app.js")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log('ui');");

    // A client-side route has no file behind it; index.html comes back.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/tenants/42")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>tenant ui</html>");
}
