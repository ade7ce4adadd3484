//! Reverse proxy to the tenant API and cloud agent services.
//!
//! A single dispatch entry point, wired as the router fallback, routes each
//! request through an explicit pipeline: mount match, credential injection
//! (agent mount only), path/Host rewrite, then one forwarding call. Each
//! stage hands over a new request value; nothing mutates shared state.

use axum::{
    body::Body,
    extract::State,
    http::{Request, Uri, header},
    response::Response,
};
use log::{debug, error, warn};
use tokio::time::timeout;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::credential;
use crate::upstream::{UpstreamName, UpstreamTarget};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Route an unmatched request to the upstream whose public mount prefixes
/// it, or to the static frontend when no mount matches.
///
/// Mount checks run in a fixed order (agent before primary, first match
/// wins); the first-party API is matched earlier by its explicit routes.
pub async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> ApiResult<Response> {
    let path = req.uri().path().to_string();
    let Some(matched) = state.upstreams.match_path(&path) else {
        return serve_static(&state, req).await;
    };
    let target = state.upstreams.resolve(matched.public_mount)?;

    let req = match target.name {
        UpstreamName::Agent => credential::inject_bearer(req, state.tokens.as_ref()).await?,
        UpstreamName::Primary => req,
    };
    let req = rewrite(req, target, matched.remainder)?;
    forward(&state, req, target).await
}

/// Rewrite a request for the chosen upstream: absolute outbound URI with
/// the mount stripped, the private base prepended and the query carried
/// verbatim, plus a Host header matching the target authority. Everything
/// else passes through byte-for-byte.
fn rewrite(
    mut req: Request<Body>,
    target: &UpstreamTarget,
    remainder: &str,
) -> ApiResult<Request<Body>> {
    let target_uri = target.target_uri(remainder, req.uri().query());
    debug!("proxying {} {} -> {}", req.method(), req.uri().path(), target_uri);

    let uri: Uri = target_uri.parse().map_err(|e| {
        error!("invalid target URI {}: {:?}", target_uri, e);
        ApiError::internal(format!("invalid outbound URI for upstream {}", target.name))
    })?;
    *req.uri_mut() = uri;

    // The original Host header must not reach the upstream; a mismatched
    // virtual host would route the request into the void.
    if let Some(authority) = req.uri().authority() {
        let value = header::HeaderValue::from_str(authority.as_str()).map_err(|e| {
            error!("invalid Host header value {}: {:?}", authority.as_str(), e);
            ApiError::internal(format!("invalid authority for upstream {}", target.name))
        })?;
        req.headers_mut().insert(header::HOST, value);
    }

    Ok(req)
}

/// Perform the upstream round-trip and relay the response verbatim.
///
/// Upstream status codes, 5xx included, are relayed as-is; only transport
/// failures and the round-trip timeout are translated to gateway statuses.
/// Never retries: forwarding is at-most-once. Dropping the timed-out future
/// tears down the outbound connection.
async fn forward(
    state: &AppState,
    req: Request<Body>,
    target: &UpstreamTarget,
) -> ApiResult<Response> {
    let response = match timeout(state.proxy_timeout, state.http_client.request(req)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!("proxy request to {} failed: {:?}", target.name, e);
            return Err(ApiError::bad_gateway(format!(
                "upstream {} unreachable",
                target.name
            )));
        }
        Err(_) => {
            warn!(
                "proxy request to {} timed out after {:?}",
                target.name, state.proxy_timeout
            );
            return Err(ApiError::gateway_timeout(format!(
                "upstream {} did not respond in time",
                target.name
            )));
        }
    };

    // Convert hyper response to axum response
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}

/// Serve the prebuilt frontend for non-API, non-proxy paths.
///
/// Unknown paths fall back to index.html so client-side routing keeps
/// working after a hard refresh.
async fn serve_static(state: &AppState, req: Request<Body>) -> ApiResult<Response> {
    let Some(dir) = state.static_dir.as_ref() else {
        return Err(ApiError::not_found(format!(
            "no route for {}",
            req.uri().path()
        )));
    };

    let site = ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(dir.join("index.html")));

    match site.oneshot(req).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(infallible) => match infallible {},
    }
}
