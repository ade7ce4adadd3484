//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::credential::TokenProvider;
use crate::upstream::Upstreams;

/// Configuration keys whose values never leave the process.
const SECRET_KEYS: [&str; 4] = ["token", "password", "secret", "api_key"];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Mount points and base URLs for the two proxied services.
    pub upstreams: Arc<Upstreams>,
    /// Source of the bearer token injected on agent-bound requests.
    pub tokens: Arc<dyn TokenProvider>,
    /// HTTP client for forwarding requests upstream.
    pub http_client: Client<HttpConnector, Body>,
    /// Upper bound on a single upstream round-trip.
    pub proxy_timeout: Duration,
    /// Sanitized configuration served to the frontend at /config.
    pub frontend_config: Arc<serde_json::Value>,
    /// Directory of prebuilt frontend assets, if static delivery is on.
    pub static_dir: Option<PathBuf>,
    /// Public mount of the first-party API.
    pub api_mount: String,
    /// Origins allowed by CORS; empty means permissive.
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        upstreams: Upstreams,
        tokens: Arc<dyn TokenProvider>,
        proxy_timeout: Duration,
    ) -> Self {
        let http_client: Client<HttpConnector, Body> =
            Client::builder(TokioExecutor::new()).build_http();

        Self {
            upstreams: Arc::new(upstreams),
            tokens,
            http_client,
            proxy_timeout,
            frontend_config: Arc::new(serde_json::Value::Null),
            static_dir: None,
            api_mount: "/api".to_string(),
            cors_origins: Vec::new(),
        }
    }

    /// Set the configuration value exposed at /config.
    ///
    /// Secret-bearing keys are stripped here, so no caller can accidentally
    /// publish a credential to the browser.
    pub fn with_frontend_config(mut self, mut value: serde_json::Value) -> Self {
        strip_secrets(&mut value);
        self.frontend_config = Arc::new(value);
        self
    }

    /// Serve the prebuilt frontend from the given directory.
    pub fn with_static_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.static_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Mount the first-party API somewhere other than /api.
    pub fn with_api_mount(mut self, mount: impl Into<String>) -> Self {
        self.api_mount = mount.into();
        self
    }

    /// Restrict CORS to the given origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

/// Remove secret-bearing keys from a config value, at any nesting depth.
fn strip_secrets(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|key, _| !SECRET_KEYS.contains(&key.as_str()));
            for nested in map.values_mut() {
                strip_secrets(nested);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                strip_secrets(item);
            }
        }
        _ => {}
    }
}
