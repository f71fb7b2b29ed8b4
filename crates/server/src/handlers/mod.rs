//! Request handlers.

pub mod download;
pub mod register;
pub mod upload;

pub use download::download;
pub use register::register;
pub use upload::upload;

use axum::http::StatusCode;

/// GET /health - liveness probe.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
