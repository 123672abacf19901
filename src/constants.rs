//! # Constants
//!
//! Shared constants used throughout the sync job.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Label written on every object this tool creates or updates
pub const PROVENANCE_LABEL_KEY: &str = "app.kubernetes.io/updated-by";

/// Value of the provenance label
pub const PROVENANCE_LABEL_VALUE: &str = "vault-k8s-sync";

/// Auth method used when `VAULT_AUTH_METHOD` is unset or empty
pub const DEFAULT_AUTH_METHOD: &str = "token";

/// Vault HTTP API version prefix
pub const VAULT_API_PREFIX: &str = "v1";

/// Header carrying the Vault client token
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Header scoping a request to a Vault namespace (Enterprise / HCP)
pub const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Endpoint listing the secrets engines mounted on the backend
pub const VAULT_MOUNTS_PATH: &str = "sys/mounts";

/// Default deadline for a single Vault HTTP request (seconds)
pub const DEFAULT_VAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout for the kube client (seconds)
pub const DEFAULT_KUBE_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default read timeout for the kube client (seconds)
pub const DEFAULT_KUBE_READ_TIMEOUT_SECS: u64 = 30;

/// Default log output format
pub const DEFAULT_LOG_FORMAT: &str = "json";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "vault_k8s_sync=info";

/// Environment variable names recognised by [`crate::config::ConfigSource::from_env`]
pub mod env {
    pub const VAULT_ADDRESS: &str = "VAULT_ADDRESS";
    pub const VAULT_AUTH_METHOD: &str = "VAULT_AUTH_METHOD";
    pub const VAULT_TOKEN: &str = "VAULT_TOKEN";
    pub const VAULT_APPROLE_ID: &str = "VAULT_APPROLE_ID";
    pub const VAULT_APPROLE_SECRET_ID: &str = "VAULT_APPROLE_SECRET_ID";
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    pub const VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";
    pub const VAULT_ENGINE: &str = "VAULT_ENGINE";
    pub const VAULT_SECRET_PATH: &str = "VAULT_SECRET_PATH";
    pub const KUBECONFIG: &str = "KUBECONFIG";
    pub const KUBERNETES_NAMESPACE: &str = "KUBERNETES_NAMESPACE";
    pub const LOAD_AS_CONFIGMAP: &str = "LOAD_AS_CONFIGMAP";
    pub const OBJECT_NAME_TO_APPLY: &str = "OBJECT_NAME_TO_APPLY";

    /// Every key that makes up a [`crate::config::SyncConfig`]
    pub const ALL: [&str; 13] = [
        VAULT_ADDRESS,
        VAULT_AUTH_METHOD,
        VAULT_TOKEN,
        VAULT_APPROLE_ID,
        VAULT_APPROLE_SECRET_ID,
        GITHUB_TOKEN,
        VAULT_NAMESPACE,
        VAULT_ENGINE,
        VAULT_SECRET_PATH,
        KUBECONFIG,
        KUBERNETES_NAMESPACE,
        LOAD_AS_CONFIGMAP,
        OBJECT_NAME_TO_APPLY,
    ];

    pub const VAULT_REQUEST_TIMEOUT_SECS: &str = "VAULT_REQUEST_TIMEOUT_SECS";
    pub const KUBE_CONNECT_TIMEOUT_SECS: &str = "KUBE_CONNECT_TIMEOUT_SECS";
    pub const KUBE_READ_TIMEOUT_SECS: &str = "KUBE_READ_TIMEOUT_SECS";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}
