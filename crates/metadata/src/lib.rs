//! Metadata store abstraction and implementations for Scatter.
//!
//! This crate provides the control-plane data model:
//! - File records and their ordered chunk lists
//! - Registered storage nodes
//! - Per-node chunk statistics derived from the chunks relation

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use repos::{FileRepo, NodeRepo};
pub use store::{MetadataStore, SqliteStore};

use scatter_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
