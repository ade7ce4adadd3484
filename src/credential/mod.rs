//! Bearer credential sourcing for the agent proxy.
//!
//! The cloud agent never sees a browser-supplied Authorization header: the
//! gateway resolves its own credential for every forwarded request and
//! overwrites whatever the client sent. Requests without a resolvable
//! credential are rejected before any outbound connection is opened.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, header};
use thiserror::Error;

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Errors that can occur while resolving or attaching a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No token is configured or the source cannot produce one.
    #[error("no agent credential available")]
    Unavailable,

    /// The resolved token cannot be carried in an HTTP header.
    #[error("agent credential is not a valid header value")]
    Invalid,
}

/// Source of the bearer token attached to agent-bound requests.
///
/// Implementations are queried once per forwarded request; the proxy never
/// caches the result across requests, so a source backed by refreshable
/// session state always hands out its current token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> CredentialResult<String>;
}

/// Token taken from process configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> CredentialResult<String> {
        self.token.clone().ok_or(CredentialError::Unavailable)
    }
}

/// Attach `Authorization: Bearer <token>` to an agent-bound request.
///
/// Any client-supplied Authorization header is replaced: the gateway is the
/// sole authority on which credential reaches the agent. Returns a new
/// request value; on error the request must not be forwarded.
pub async fn inject_bearer(
    mut request: Request<Body>,
    provider: &dyn TokenProvider,
) -> CredentialResult<Request<Body>> {
    let token = provider.bearer_token().await?;
    let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| CredentialError::Invalid)?;
    request.headers_mut().insert(header::AUTHORIZATION, value);
    Ok(request)
}
