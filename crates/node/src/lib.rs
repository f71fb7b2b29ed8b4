//! Storage node side of the Scatter object store.
//!
//! This crate provides:
//! - The on-disk chunk store used by the `scatter-node` binary
//! - The HTTP surface nodes expose (`PUT`/`GET`/`DELETE /chunks/{id}`)
//! - The frontend-side node client and its factory
//! - Node self-registration against the frontend

pub mod client;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod register;
pub mod store;

pub use client::{HttpNodeClient, HttpNodeClientFactory, NodeClient, NodeClientFactory};
pub use error::{ChunkStoreError, NodeClientError};
pub use handler::create_router;
pub use store::{ByteStream, ChunkStore};
