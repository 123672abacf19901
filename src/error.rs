//! # Errors
//!
//! Error taxonomy for a sync pass. Each pipeline stage has its own error type
//! and [`SyncError`] is the single terminal reason returned by the orchestrator.
//! Every variant is fatal for the current invocation; nothing is retried.

use thiserror::Error;

/// Missing or contradictory configuration, detected before any I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Vault address is required")]
    MissingAddress,
    #[error("Vault engine name is required")]
    MissingEngineName,
    #[error("Vault secret path is required")]
    MissingSecretPath,
    #[error("Unsupported Vault auth method: {0}")]
    UnsupportedAuthMethod(String),
    #[error("Vault RoleId and SecretId are required")]
    MissingAppRoleCredentials,
    #[error("Github token is required")]
    MissingGithubToken,
    #[error("Vault token is required")]
    MissingToken,
    #[error("Kubeconfig is required")]
    MissingKubeconfig,
    #[error("Kubernetes namespace is required")]
    MissingNamespace,
    #[error("Kubernetes object name to apply is required")]
    MissingObjectName,
}

/// Failure while obtaining an authenticated Vault handle
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to reach Vault endpoint {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Vault rejected the {method} login (HTTP {status}): {message}")]
    Rejected {
        method: &'static str,
        status: u16,
        message: String,
    },
    #[error("Vault {method} login response has no auth block")]
    MissingAuthBlock { method: &'static str },
    #[error("Vault {method} login returned an empty client token")]
    EmptyToken { method: &'static str },
    #[error("Vault {method} login response could not be parsed: {reason}")]
    InvalidResponse { method: &'static str, reason: String },
}

/// Failure while reading the secret payload
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("vault engine does not exist: {engine}")]
    EngineNotFound { engine: String },
    #[error("failed to parse Vault secret data at {path}")]
    MalformedPayload { path: String },
    #[error("Vault returned HTTP {status} for {path}: {message}")]
    Backend {
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to reach Vault for {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Vault response for {path} could not be parsed: {reason}")]
    InvalidResponse { path: String, reason: String },
}

/// Failure while turning the connection descriptor into a cluster handle
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("provided base64 kubeconfig is empty")]
    EmptyDescriptor,
    #[error("provided namespace is empty")]
    EmptyGrouping,
    #[error("failed to decode kubeconfig: {0:#}")]
    DecodeFailure(#[source] anyhow::Error),
}

/// Failure while writing the object into the cluster
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to write {kind} {namespace}/{name}: {source:#}")]
    Write {
        kind: &'static str,
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Terminal outcome of a failed sync pass
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("secret fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("cluster resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl SyncError {
    /// Short stage name used as a structured log field
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            SyncError::Config(_) => "validate",
            SyncError::Auth(_) => "authenticate",
            SyncError::Fetch(_) => "fetch",
            SyncError::Resolve(_) => "resolve",
            SyncError::Reconcile(_) => "reconcile",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_match_existing_callers() {
        assert_eq!(ConfigError::MissingAddress.to_string(), "Vault address is required");
        assert_eq!(
            ConfigError::MissingAppRoleCredentials.to_string(),
            "Vault RoleId and SecretId are required"
        );
        assert_eq!(
            ConfigError::UnsupportedAuthMethod("ldap".to_string()).to_string(),
            "Unsupported Vault auth method: ldap"
        );
    }

    #[test]
    fn test_sync_error_stage_follows_variant() {
        let err: SyncError = ConfigError::MissingKubeconfig.into();
        assert_eq!(err.stage(), "validate");

        let err: SyncError = FetchError::EngineNotFound {
            engine: "application".to_string(),
        }
        .into();
        assert_eq!(err.stage(), "fetch");
        assert_eq!(
            err.to_string(),
            "secret fetch failed: vault engine does not exist: application"
        );

        let err: SyncError = ResolveError::EmptyGrouping.into();
        assert_eq!(err.stage(), "resolve");
    }
}
