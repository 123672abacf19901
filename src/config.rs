//! # Configuration
//!
//! Typed configuration for one sync pass.
//!
//! Raw values are gathered into a [`ConfigSource`] (environment snapshot, CLI
//! overlay, or an in-process map in tests) and then assembled into a
//! [`SyncConfig`] by [`SyncConfig::from_source`], which is also where the
//! configuration is validated. Nothing in the pipeline reads the process
//! environment after that point.
//!
//! ## Validation order
//!
//! Fields are checked in a fixed order and the first violation is returned:
//!
//! 1. Vault address
//! 2. engine name
//! 3. secret path
//! 4. auth method (empty means `token`)
//! 5. AppRole role id + secret id (when method is `approle`)
//! 6. GitHub token (when method is `github`)
//! 7. Vault token (when method is `token`)
//! 8. kubeconfig
//! 9. Kubernetes namespace
//! 10. object name

use crate::constants::{self, env};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw key/value configuration keyed by the environment variable names in
/// [`crate::constants::env`]. Missing keys read as empty strings.
#[derive(Clone, Default)]
pub struct ConfigSource {
    values: HashMap<String, String>,
}

impl fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("ConfigSource")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

impl ConfigSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every recognised variable from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        let mut source = Self::new();
        for key in env::ALL {
            if let Some(value) = env_var_opt(key) {
                source.set(key, value);
            }
        }
        source
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Vault authentication method selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Token,
    AppRole,
    Github,
}

impl AuthMethod {
    /// Parse the selector, treating an empty value as the default (`token`).
    /// Matching ignores case and surrounding whitespace.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedAuthMethod`] for any other value.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        let normalized = if trimmed.is_empty() {
            constants::DEFAULT_AUTH_METHOD.to_string()
        } else {
            trimmed.to_ascii_lowercase()
        };
        match normalized.as_str() {
            "token" => Ok(AuthMethod::Token),
            "approle" => Ok(AuthMethod::AppRole),
            "github" => Ok(AuthMethod::Github),
            _ => Err(ConfigError::UnsupportedAuthMethod(trimmed.to_string())),
        }
    }

    /// Path segment of the login endpoint, also used in logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Token => "token",
            AuthMethod::AppRole => "approle",
            AuthMethod::Github => "github",
        }
    }
}

/// Credential set for the selected auth method.
///
/// Holding the credentials in the variant means a config can never carry a
/// method without its matching credentials. Values are wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub enum Credentials {
    Token { token: String },
    AppRole { role_id: String, secret_id: String },
    Github { token: String },
}

impl Credentials {
    #[must_use]
    pub fn method(&self) -> AuthMethod {
        match self {
            Credentials::Token { .. } => AuthMethod::Token,
            Credentials::AppRole { .. } => AuthMethod::AppRole,
            Credentials::Github { .. } => AuthMethod::Github,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token { .. } => f.debug_struct("Token").field("token", &"***").finish(),
            Credentials::AppRole { role_id, .. } => f
                .debug_struct("AppRole")
                .field("role_id", role_id)
                .field("secret_id", &"***")
                .finish(),
            Credentials::Github { .. } => {
                f.debug_struct("Github").field("token", &"***").finish()
            }
        }
    }
}

/// Everything needed to authenticate to Vault and locate the secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub address: String,
    pub namespace: Option<String>,
    pub engine_name: String,
    pub secret_path: String,
    pub credentials: Credentials,
}

/// Kind of Kubernetes object the payload is written into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectKind {
    /// Opaque `Secret` (credential bundle)
    #[default]
    Secret,
    /// `ConfigMap` (plain configuration)
    ConfigMap,
}

impl ObjectKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Secret => "Secret",
            ObjectKind::ConfigMap => "ConfigMap",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target cluster: a base64-encoded kubeconfig plus the namespace to write into
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ClusterTarget {
    pub kubeconfig: String,
    pub namespace: String,
}

impl fmt::Debug for ClusterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterTarget")
            .field("kubeconfig", &"***")
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Validated configuration for one sync pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub backend: BackendConfig,
    pub cluster: ClusterTarget,
    pub object_kind: ObjectKind,
    pub object_name: String,
}

impl SyncConfig {
    /// Assemble and validate a configuration from raw values.
    ///
    /// See the module docs for the order in which fields are checked.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] encountered.
    pub fn from_source(source: &ConfigSource) -> Result<Self, ConfigError> {
        let address = required(source, env::VAULT_ADDRESS, ConfigError::MissingAddress)?;
        let engine_name = required(source, env::VAULT_ENGINE, ConfigError::MissingEngineName)?;
        let secret_path =
            required(source, env::VAULT_SECRET_PATH, ConfigError::MissingSecretPath)?;

        let method = AuthMethod::parse(source.get(env::VAULT_AUTH_METHOD))?;
        let credentials = match method {
            AuthMethod::AppRole => {
                let role_id = source.get(env::VAULT_APPROLE_ID);
                let secret_id = source.get(env::VAULT_APPROLE_SECRET_ID);
                if role_id.is_empty() || secret_id.is_empty() {
                    return Err(ConfigError::MissingAppRoleCredentials);
                }
                Credentials::AppRole {
                    role_id: role_id.to_string(),
                    secret_id: secret_id.to_string(),
                }
            }
            AuthMethod::Github => Credentials::Github {
                token: required(source, env::GITHUB_TOKEN, ConfigError::MissingGithubToken)?,
            },
            AuthMethod::Token => Credentials::Token {
                token: required(source, env::VAULT_TOKEN, ConfigError::MissingToken)?,
            },
        };

        let kubeconfig = required(source, env::KUBECONFIG, ConfigError::MissingKubeconfig)?;
        let namespace = required(
            source,
            env::KUBERNETES_NAMESPACE,
            ConfigError::MissingNamespace,
        )?;
        let object_name = required(
            source,
            env::OBJECT_NAME_TO_APPLY,
            ConfigError::MissingObjectName,
        )?;

        let object_kind = if source
            .get(env::LOAD_AS_CONFIGMAP)
            .trim()
            .eq_ignore_ascii_case("true")
        {
            ObjectKind::ConfigMap
        } else {
            ObjectKind::Secret
        };

        let vault_namespace = source.get(env::VAULT_NAMESPACE).trim();

        Ok(Self {
            backend: BackendConfig {
                address,
                namespace: (!vault_namespace.is_empty()).then(|| vault_namespace.to_string()),
                engine_name,
                secret_path,
                credentials,
            },
            cluster: ClusterTarget {
                kubeconfig,
                namespace,
            },
            object_kind,
            object_name,
        })
    }
}

fn required(source: &ConfigSource, key: &str, missing: ConfigError) -> Result<String, ConfigError> {
    let value = source.get(key);
    if value.is_empty() {
        Err(missing)
    } else {
        Ok(value.to_string())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Unknown values fall back to JSON
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("text") {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

/// Process-level settings that are not part of the sync contract
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Deadline for each Vault HTTP request (seconds)
    pub vault_request_timeout_secs: u64,
    /// Kube client connect timeout (seconds)
    pub kube_connect_timeout_secs: u64,
    /// Kube client read timeout (seconds)
    pub kube_read_timeout_secs: u64,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            vault_request_timeout_secs: DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
            kube_connect_timeout_secs: DEFAULT_KUBE_CONNECT_TIMEOUT_SECS,
            kube_read_timeout_secs: DEFAULT_KUBE_READ_TIMEOUT_SECS,
            log_format: LogFormat::parse(DEFAULT_LOG_FORMAT),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            vault_request_timeout_secs: env_var_or_default(
                env::VAULT_REQUEST_TIMEOUT_SECS,
                DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
            ),
            kube_connect_timeout_secs: env_var_or_default(
                env::KUBE_CONNECT_TIMEOUT_SECS,
                DEFAULT_KUBE_CONNECT_TIMEOUT_SECS,
            ),
            kube_read_timeout_secs: env_var_or_default(
                env::KUBE_READ_TIMEOUT_SECS,
                DEFAULT_KUBE_READ_TIMEOUT_SECS,
            ),
            log_format: LogFormat::parse(&env_var_or_default_str(
                env::LOG_FORMAT,
                DEFAULT_LOG_FORMAT,
            )),
        }
    }

    #[must_use]
    pub fn vault_request_timeout(&self) -> Duration {
        Duration::from_secs(self.vault_request_timeout_secs)
    }

    #[must_use]
    pub fn kube_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.kube_connect_timeout_secs)
    }

    #[must_use]
    pub fn kube_read_timeout(&self) -> Duration {
        Duration::from_secs(self.kube_read_timeout_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
