//! Registry client for the PyPI JSON API.

use pispy_data::TopPackages;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("pispy/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Errors and payloads
// ============================================================================

/// Why a registry request did not produce a usable payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("package not found (HTTP {status})")]
    NotFound { status: u16 },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl FetchError {
    /// True for failures to talk to the registry at all (including timeouts),
    /// as opposed to answers the registry gave.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Timeout(_))
    }
}

/// A decoded registry response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub status: u16,
    pub body: Value,
}

/// Turn a status code and body into a payload.
///
/// Anything other than `200 OK` means the package does not exist; the body
/// is only decoded for successful responses.
pub fn decode_response(status: u16, body: &[u8]) -> Result<RawPayload, FetchError> {
    if status != 200 {
        return Err(FetchError::NotFound { status });
    }
    let body: Value = serde_json::from_slice(body)?;
    Ok(RawPayload { status, body })
}

// ============================================================================
// Registry trait
// ============================================================================

/// Source of package metadata.
///
/// Implemented by [`PypiClient`] for the real registry; tests substitute
/// in-memory registries.
pub trait Registry: Send + Sync + 'static {
    /// Fetch the `/pypi/{package}/json` document. One request, no retries.
    fn fetch(&self, package: &str) -> impl Future<Output = Result<RawPayload, FetchError>> + Send;

    /// Fetch the registry-wide ranking of packages by size.
    fn top_packages(&self) -> impl Future<Output = Result<TopPackages, FetchError>> + Send;
}

// ============================================================================
// PyPI client
// ============================================================================

/// Where the registry lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry root, e.g. `https://pypi.org`.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RegistryConfig {
    /// `{base}/pypi/{package}/json`, with the package name percent-encoded.
    pub fn package_url(&self, package: &str) -> String {
        format!(
            "{}/pypi/{}/json",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(package)
        )
    }

    pub fn stats_url(&self) -> String {
        format!("{}/stats/", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Clone)]
pub struct PypiClient {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl PypiClient {
    pub fn new(config: RegistryConfig) -> Result<Self, FetchError> {
        // Redirects are followed by the default policy.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::Transport(err)
        }
    }

    async fn get(&self, url: &str) -> Result<RawPayload, FetchError> {
        debug!(url, "registry request");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        debug!(url, status, bytes = body.len(), "registry response");

        decode_response(status, &body).inspect_err(|err| {
            if matches!(err, FetchError::Malformed(_)) {
                warn!(url, %err, "registry returned a body that is not JSON");
            }
        })
    }
}

impl Registry for PypiClient {
    async fn fetch(&self, package: &str) -> Result<RawPayload, FetchError> {
        self.get(&self.config.package_url(package)).await
    }

    async fn top_packages(&self) -> Result<TopPackages, FetchError> {
        let payload = self.get(&self.config.stats_url()).await?;
        Ok(TopPackages::normalize(&payload.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_status_decodes_body() {
        let payload = decode_response(200, br#"{"info": {"name": "six"}}"#).unwrap();
        assert_eq!(payload.status, 200);
        assert_eq!(payload.body["info"]["name"], "six");
    }

    #[test]
    fn non_ok_status_is_not_found() {
        for status in [404, 301, 500, 204] {
            let err = decode_response(status, b"<html>nope</html>").unwrap_err();
            assert!(
                matches!(err, FetchError::NotFound { status: s } if s == status),
                "status {status}"
            );
        }
    }

    #[test]
    fn invalid_body_is_malformed() {
        let err = decode_response(200, b"<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(!err.is_transport());
    }

    #[test]
    fn timeout_counts_as_transport() {
        assert!(FetchError::Timeout(Duration::from_secs(3)).is_transport());
        assert!(!FetchError::NotFound { status: 404 }.is_transport());
    }

    #[test]
    fn package_url_encodes_name() {
        let config = RegistryConfig::default();
        assert_eq!(
            config.package_url("requests"),
            "https://pypi.org/pypi/requests/json"
        );
        assert_eq!(
            config.package_url("a b/c"),
            "https://pypi.org/pypi/a%20b%2Fc/json"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let config = RegistryConfig {
            base_url: "http://localhost:8080/mirror/".to_string(),
            timeout: DEFAULT_TIMEOUT,
        };
        assert_eq!(
            config.package_url("six"),
            "http://localhost:8080/mirror/pypi/six/json"
        );
        assert_eq!(config.stats_url(), "http://localhost:8080/mirror/stats/");
    }
}
