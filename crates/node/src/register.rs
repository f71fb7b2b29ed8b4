//! Node self-registration against the frontend.

use crate::error::NodeClientError;

/// Register this node's advertised base URL with the frontend.
///
/// Issued once at startup; the frontend never initiates. Restart recovery
/// relies on nodes re-registering.
pub async fn register(
    http: &reqwest::Client,
    front_url: &str,
    advertise_url: &str,
) -> Result<(), NodeClientError> {
    let url = format!("{}/register", front_url.trim_end_matches('/'));
    tracing::info!(front_url = %front_url, base_url = %advertise_url, "Registering node");

    let resp = http
        .post(&url)
        .query(&[("baseURL", advertise_url)])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(NodeClientError::Status {
            status: status.as_u16(),
            url,
        });
    }

    tracing::info!(base_url = %advertise_url, "Registered");
    Ok(())
}

/// The base URL advertised when none is configured:
/// `http://<hostname>:<listen port>`.
pub fn default_advertise_url(port: u16) -> String {
    let hostname = gethostname::gethostname();
    format!("http://{}:{}", hostname.to_string_lossy(), port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertise_url_uses_hostname_and_port() {
        let url = default_advertise_url(8080);
        assert!(url.starts_with("http://"));
        assert!(url.ends_with(":8080"));
    }
}
