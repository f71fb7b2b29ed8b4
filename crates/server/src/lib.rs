//! Frontend server for the Scatter object store.
//!
//! This crate provides the HTTP control plane:
//! - Multipart upload with concurrent chunk fan-out and cleanup
//! - Ordered streaming download
//! - Node registration
//! - Node-client registry with a periodically refreshed stats snapshot
//! - Least-filled chunk placement

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod placement;
pub mod range;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use range::{RangeReader, UploadSource};
pub use routes::create_router;
pub use state::{AppState, NodeRegistry, spawn_stat_updater};
