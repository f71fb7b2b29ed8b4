//! Frontend-side remote handle to one storage node.

use crate::error::NodeClientError;
use crate::store::ByteStream;
use async_trait::async_trait;
use futures::TryStreamExt;
use std::sync::Arc;
use uuid::Uuid;

/// Remote handle to one storage node.
///
/// Write/Read/Delete mirror the chunk store semantics over HTTP. No retries
/// at this layer; retry policy lives with the caller.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Stream `body` into the chunk `id` on the node.
    async fn write(&self, id: Uuid, body: ByteStream) -> Result<(), NodeClientError>;

    /// Open chunk `id` on the node as a byte stream.
    async fn read(&self, id: Uuid) -> Result<ByteStream, NodeClientError>;

    /// Delete chunk `id` on the node. Idempotent.
    async fn delete(&self, id: Uuid) -> Result<(), NodeClientError>;

    /// The configured base URL, verbatim.
    fn base_url(&self) -> &str;
}

/// Factory producing node clients for a base URL.
///
/// Injected into the frontend so tests can substitute in-process fakes.
pub trait NodeClientFactory: Send + Sync {
    /// Create a client for `base_url`.
    fn new_client(&self, base_url: &str) -> Arc<dyn NodeClient>;
}

/// HTTP node client carrying the chunk identifier in the URL path.
pub struct HttpNodeClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpNodeClient {
    /// Create a client for `base_url` using the given transport.
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    fn chunk_url(&self, id: Uuid) -> String {
        format!("{}/chunks/{}", self.base_url.trim_end_matches('/'), id)
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn write(&self, id: Uuid, body: ByteStream) -> Result<(), NodeClientError> {
        let url = self.chunk_url(id);
        let resp = self
            .http
            .put(&url)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;
        check_status(&url, resp.status())
    }

    async fn read(&self, id: Uuid) -> Result<ByteStream, NodeClientError> {
        let url = self.chunk_url(id);
        let resp = self.http.get(&url).send().await?;
        check_status(&url, resp.status())?;

        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(stream))
    }

    async fn delete(&self, id: Uuid) -> Result<(), NodeClientError> {
        let url = self.chunk_url(id);
        let resp = self.http.delete(&url).send().await?;
        check_status(&url, resp.status())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn check_status(url: &str, status: reqwest::StatusCode) -> Result<(), NodeClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(NodeClientError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Factory producing [`HttpNodeClient`]s that share one transport.
pub struct HttpNodeClientFactory {
    http: reqwest::Client,
}

impl HttpNodeClientFactory {
    /// Create a factory sharing `http` across all produced clients.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl NodeClientFactory for HttpNodeClientFactory {
    fn new_client(&self, base_url: &str) -> Arc<dyn NodeClient> {
        Arc::new(HttpNodeClient::new(base_url, self.http.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_url_joins_base_and_id() {
        let id = Uuid::new_v4();
        let client = HttpNodeClient::new("http://node1:8080", reqwest::Client::new());
        assert_eq!(
            client.chunk_url(id),
            format!("http://node1:8080/chunks/{id}")
        );

        let trailing = HttpNodeClient::new("http://node1:8080/", reqwest::Client::new());
        assert_eq!(
            trailing.chunk_url(id),
            format!("http://node1:8080/chunks/{id}")
        );
    }

    #[test]
    fn base_url_is_reported_verbatim() {
        let client = HttpNodeClient::new("http://node1:8080", reqwest::Client::new());
        assert_eq!(client.base_url(), "http://node1:8080");
    }
}
