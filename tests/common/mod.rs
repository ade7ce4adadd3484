//! Test utilities and common setup.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};

use tenant_gateway::api::{self, AppState};
use tenant_gateway::credential::StaticTokenProvider;
use tenant_gateway::upstream::{UpstreamName, UpstreamTarget, Upstreams};

/// Token the test credential provider hands out.
pub const TEST_TOKEN: &str = "test-agent-token";

/// Mount layout mirroring the default deployment.
pub fn test_upstreams(agent_url: &str, primary_url: &str) -> Upstreams {
    Upstreams::new(
        UpstreamTarget::new(UpstreamName::Agent, agent_url, "/api/acapy", "/"),
        UpstreamTarget::new(UpstreamName::Primary, primary_url, "/api/traction", "/api"),
    )
}

/// Gateway state pointing at the given upstream base URLs.
pub fn test_state(agent_url: &str, primary_url: &str, token: Option<&str>) -> AppState {
    AppState::new(
        test_upstreams(agent_url, primary_url),
        Arc::new(StaticTokenProvider::new(token.map(str::to_string))),
        Duration::from_secs(2),
    )
}

/// Router wired like the default deployment, with a known agent token.
pub fn test_app(agent_url: &str, primary_url: &str) -> Router {
    api::create_router(test_state(agent_url, primary_url, Some(TEST_TOKEN)))
}

/// Spawn a loopback upstream that reports everything it received as JSON
/// and counts the requests that reached it.
pub async fn spawn_echo_upstream() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().fallback(move |req: Request| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            echo(req).await
        }
    });

    (spawn_upstream(app).await, hits)
}

/// Spawn a loopback upstream that answers every request with a fixed status
/// and body.
pub async fn spawn_failing_upstream(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().fallback(move || async move { (status, body) });
    spawn_upstream(app).await
}

/// Spawn a listener that accepts connections but never answers, to exercise
/// the proxy timeout.
pub async fn spawn_hanging_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let _keep_open = socket;
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{addr}")
}

/// A base URL nothing listens on, to exercise connection failures.
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Collect a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Collect a response body as a string.
pub async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn echo(req: Request) -> Json<Value> {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, 1024 * 1024).await.unwrap();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "authorization": header("authorization"),
        "host": header("host"),
        "body": String::from_utf8_lossy(&body),
    }))
}
