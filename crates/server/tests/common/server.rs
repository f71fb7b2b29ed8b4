//! Server test utilities.

use crate::common::fakes::InMemoryNodeFactory;
use crate::common::fixtures::multipart_body;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use scatter_core::config::FrontConfig;
use scatter_metadata::{MetadataStore, SqliteStore};
use scatter_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test frontend wrapper with in-memory nodes and temporary metadata.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub nodes: Arc<InMemoryNodeFactory>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server backed by a fresh SQLite metadata store.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(temp_dir.path().join("metadata.db"))
                .await
                .expect("Failed to create metadata store"),
        );
        Self::with_metadata(temp_dir, metadata)
    }

    /// Create a test server over an existing metadata store.
    pub fn with_metadata(temp_dir: TempDir, metadata: Arc<dyn MetadataStore>) -> Self {
        let nodes = Arc::new(InMemoryNodeFactory::default());
        let config = FrontConfig::for_testing(temp_dir.path().join("metadata.db"));
        let state = AppState::new(config, metadata, nodes.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            nodes,
            _temp_dir: temp_dir,
        }
    }

    /// Register a node via the HTTP surface and assert success.
    pub async fn register_node(&self, base_url: &str) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/register?baseURL={base_url}"))
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Upload `data` as `file_name`; returns the status and response body.
    pub async fn upload(&self, file_name: &str, data: &[u8]) -> (StatusCode, String) {
        let (content_type, body) = multipart_body("upload", file_name, data);
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, content_type)
            .header(header::HOST, "front:8080")
            .body(Body::from(body))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Download `file_name`; returns the status and body bytes.
    pub async fn download(&self, file_name: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/download/{file_name}"))
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }
}
