//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{Router, routing::get};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::proxy;
use super::state::AppState;

/// Create the application router.
///
/// Route precedence is a behavioral contract: explicit first-party routes
/// win, every other path goes through the proxy dispatcher, which checks
/// the agent mount before the primary mount and hands non-proxy paths to
/// the static frontend. The proxy ordering lives in
/// `Upstreams::match_path`, not in route registration.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state);

    // Tracing layer with request spans and timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api_mount = state.api_mount.clone();

    // First-party endpoints under the API mount
    let api_routes = Router::new().route("/health", get(handlers::health));

    Router::new()
        // Frontend boot configuration, served at the root like the UI expects
        .route("/config", get(handlers::frontend_config))
        .nest(&api_mount, api_routes)
        // Everything else: proxy mounts, then static assets
        .fallback(proxy::dispatch)
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
}

/// Build the CORS layer based on configuration.
///
/// The gateway normally serves the frontend from its own origin, so with no
/// configured origins it stays permissive (the UI may be hosted elsewhere
/// during development). Configured origins switch to an exact allow-list
/// with credentials.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ];

    let headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ORIGIN,
    ];

    if state.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = state
        .cors_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: invalid origin in config: {}", origin);
                None
            })
        })
        .collect();

    if origins.is_empty() {
        tracing::error!("CORS: all configured origins are invalid!");
        CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")))
    } else {
        tracing::info!("CORS: allowing {} origin(s)", origins.len());
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
    }
}
