//! Vault REST Client
//!
//! Native REST implementation for the parts of the Vault HTTP API this tool
//! needs: login endpoints, secret reads and the mount table.
//! Uses reqwest (rustls) for HTTP requests.
//!
//! References:
//! - [Vault HTTP API](https://developer.hashicorp.com/vault/api-docs)

use super::{BackendConnector, VaultApi, VaultApiError};
use crate::constants::{VAULT_API_PREFIX, VAULT_NAMESPACE_HEADER, VAULT_TOKEN_HEADER};
use crate::error::AuthError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, debug_span, Instrument};
use zeroize::Zeroizing;

/// Vault API error response
///
/// Vault reports failures as `{"errors": ["message", ...]}`.
///
/// API Reference: https://developer.hashicorp.com/vault/api-docs#error-response
#[derive(Debug, Deserialize)]
struct VaultErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Vault REST client bound to one address and optional namespace
pub struct VaultClient {
    http_client: Client,
    base_url: String,
    namespace: Option<String>,
    token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Create a client for `address`. No request is sent.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialised (TLS setup).
    pub fn new(
        address: &str,
        namespace: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        // Create HTTP client with rustls (already configured in Cargo.toml)
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: address.trim_end_matches('/').to_string(),
            namespace: namespace
                .filter(|ns| !ns.is_empty())
                .map(ToString::to_string),
            token: None,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            VAULT_API_PREFIX,
            path.trim_start_matches('/')
        )
    }

    /// Build HTTP request with token and namespace headers
    fn make_request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.http_client.request(method, self.url(path));

        if let Some(token) = &self.token {
            request = request.header(VAULT_TOKEN_HEADER, token.as_str());
        }
        if let Some(namespace) = &self.namespace {
            request = request.header(VAULT_NAMESPACE_HEADER, namespace);
        }

        request
    }

    /// Turn a response into an optional JSON body, mapping Vault error payloads
    async fn handle_response(
        response: reqwest::Response,
    ) -> Result<Option<Value>, VaultApiError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            // Vault answers 404 both for an empty KV path and for an unmounted
            // engine. Only a body that still carries data is worth returning.
            let body = response.text().await?;
            let value = serde_json::from_str::<Value>(&body)
                .ok()
                .filter(|v| v.get("data").is_some_and(|d| !d.is_null()));
            return Ok(value);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| VaultApiError::Decode(e.to_string()))
    }
}

/// Build a [`VaultApiError::Status`] from an error response body
fn error_from_body(status: StatusCode, body: &str) -> VaultApiError {
    let message = match serde_json::from_str::<VaultErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join(", "),
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body.trim().to_string(),
    };

    VaultApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl VaultApi for VaultClient {
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(Zeroizing::new(token.to_string()));
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, VaultApiError> {
        let span = debug_span!("vault.read", vault.path = path);

        async move {
            let response = self.make_request(Method::GET, path).send().await?;
            debug!(status = response.status().as_u16(), "Vault read completed");
            Self::handle_response(response).await
        }
        .instrument(span)
        .await
    }

    async fn write(&self, path: &str, body: Value) -> Result<Option<Value>, VaultApiError> {
        let span = debug_span!("vault.write", vault.path = path);

        async move {
            let response = self
                .make_request(Method::POST, path)
                .json(&body)
                .send()
                .await?;
            debug!(status = response.status().as_u16(), "Vault write completed");
            Self::handle_response(response).await
        }
        .instrument(span)
        .await
    }
}

/// Connector producing real [`VaultClient`]s
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(
            crate::constants::DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
        ))
    }
}

impl BackendConnector for HttpConnector {
    type Api = VaultClient;

    fn connect(&self, address: &str, namespace: Option<&str>) -> Result<VaultClient, AuthError> {
        VaultClient::new(address, namespace, self.timeout).map_err(|source| AuthError::Transport {
            endpoint: address.to_string(),
            source,
        })
    }
}
