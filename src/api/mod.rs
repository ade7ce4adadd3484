//! HTTP API module.
//!
//! First-party endpoints, static frontend delivery, and the reverse proxy
//! to the tenant and agent services.

mod error;
mod handlers;
mod proxy;
mod routes;
mod state;

// Re-export error types for external use
#[allow(unused_imports)]
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
