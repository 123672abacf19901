//! # Vault Authentication
//!
//! Dispatches on the configured [`Credentials`] variant:
//!
//! - **Token** - attached to the client directly, no request is sent
//! - **AppRole** - `POST <namespace>/auth/approle/login` with `role_id` / `secret_id`
//! - **GitHub** - `POST <namespace>/auth/github/login` with the GitHub token
//!
//! Login responses must carry an `auth` block with a non-empty `client_token`.

use super::{VaultApi, VaultApiError};
use crate::config::{AuthMethod, Credentials};
use crate::error::AuthError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};

/// A [`VaultApi`] that holds a client token
#[derive(Debug)]
pub struct Authenticated<A> {
    api: A,
    method: AuthMethod,
}

impl<A: VaultApi> Authenticated<A> {
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn method(&self) -> AuthMethod {
        self.method
    }

    #[must_use]
    pub fn into_inner(self) -> A {
        self.api
    }
}

/// Login response from a Vault auth method
///
/// API Reference: https://developer.hashicorp.com/vault/api-docs/auth/approle#login-with-approle
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    auth: Option<AuthBlock>,
}

#[derive(Debug, Deserialize)]
struct AuthBlock {
    #[serde(default)]
    client_token: String,
}

/// Login endpoint for `method`, prefixed with the namespace when one is set
#[must_use]
pub fn login_path(namespace: Option<&str>, method: AuthMethod) -> String {
    match namespace.map(|ns| ns.trim_matches('/')).filter(|ns| !ns.is_empty()) {
        Some(ns) => format!("{ns}/auth/{}/login", method.as_str()),
        None => format!("auth/{}/login", method.as_str()),
    }
}

/// Authenticate `api` with `credentials`
///
/// # Errors
/// Returns an [`AuthError`] if the login call fails or its response carries no usable token.
pub async fn authenticate<A: VaultApi>(
    mut api: A,
    credentials: &Credentials,
) -> Result<Authenticated<A>, AuthError> {
    let method = credentials.method();
    let span = info_span!("vault.authenticate", auth.method = method.as_str());

    async move {
        match credentials {
            Credentials::Token { token } => {
                api.set_token(token);
            }
            Credentials::AppRole { role_id, secret_id } => {
                let body = json!({ "role_id": role_id, "secret_id": secret_id });
                let token = login(&api, method, body).await?;
                api.set_token(&token);
            }
            Credentials::Github { token } => {
                let body = json!({ "token": token });
                let token = login(&api, method, body).await?;
                api.set_token(&token);
            }
        }

        info!(auth.method = method.as_str(), "Authenticated to Vault");
        Ok(Authenticated { api, method })
    }
    .instrument(span)
    .await
}

async fn login<A: VaultApi>(api: &A, method: AuthMethod, body: Value) -> Result<String, AuthError> {
    let path = login_path(api.namespace(), method);
    let name = method.as_str();

    let response = api.write(&path, body).await.map_err(|e| match e {
        VaultApiError::Transport(source) => AuthError::Transport {
            endpoint: path.clone(),
            source,
        },
        VaultApiError::Status { status, message } => AuthError::Rejected {
            method: name,
            status,
            message,
        },
        VaultApiError::Decode(reason) => AuthError::InvalidResponse {
            method: name,
            reason,
        },
    })?;

    extract_client_token(name, response)
}

/// Pull `auth.client_token` out of a login response
fn extract_client_token(method: &'static str, response: Option<Value>) -> Result<String, AuthError> {
    let Some(response) = response else {
        return Err(AuthError::MissingAuthBlock { method });
    };

    let parsed: LoginResponse =
        serde_json::from_value(response).map_err(|e| AuthError::InvalidResponse {
            method,
            reason: e.to_string(),
        })?;

    let auth = parsed.auth.ok_or(AuthError::MissingAuthBlock { method })?;
    if auth.client_token.is_empty() {
        return Err(AuthError::EmptyToken { method });
    }

    Ok(auth.client_token)
}
