//! # Vault
//!
//! Everything that talks to the secrets backend.
//!
//! - [`client`] - REST client for the Vault HTTP API
//! - [`auth`] - auth method dispatch producing an [`auth::Authenticated`] handle
//! - [`fetch`] - secret read and payload normalization
//!
//! The pipeline only depends on the [`VaultApi`] and [`BackendConnector`]
//! traits so tests can swap the HTTP client for a scripted double.

use crate::error::AuthError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod auth;
pub mod client;
pub mod fetch;

pub use auth::{authenticate, Authenticated};
pub use client::{HttpConnector, VaultClient};
pub use fetch::{fetch, normalize_payload, secret_read_path};

/// Flat key/value payload read from Vault, ready to be written to the cluster
pub type SecretPayload = BTreeMap<String, String>;

/// Low-level failure of a single Vault API call
#[derive(Debug, Error)]
pub enum VaultApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Minimal Vault HTTP API surface used by the sync pipeline
///
/// Paths are relative to `<address>/v1/`.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Namespace this client is scoped to, if any
    fn namespace(&self) -> Option<&str>;

    /// Attach a client token to every subsequent request
    fn set_token(&mut self, token: &str);

    /// `GET` a path. `Ok(None)` means the backend had nothing there (404 or empty body).
    async fn read(&self, path: &str) -> Result<Option<Value>, VaultApiError>;

    /// `POST` a JSON body. `Ok(None)` means the backend answered without a body.
    async fn write(&self, path: &str, body: Value) -> Result<Option<Value>, VaultApiError>;
}

/// Builds an unauthenticated [`VaultApi`] bound to an address and namespace
pub trait BackendConnector: Send + Sync {
    type Api: VaultApi;

    /// # Errors
    /// Returns [`AuthError::Transport`] if the underlying client cannot be built.
    fn connect(&self, address: &str, namespace: Option<&str>) -> Result<Self::Api, AuthError>;
}
