//! # Command-line overrides
//!
//! Every setting can come from the environment; a flag given on the command
//! line takes precedence over the matching variable.
//!
//! ```bash
//! VAULT_ADDRESS=https://vault.example.com VAULT_TOKEN=... \
//!   vault-k8s-sync --vault-engine application --vault-secret-path dev/config \
//!   --kubernetes-namespace my-app --object-name app-secret
//! ```

use crate::config::ConfigSource;
use crate::constants::env;
use clap::Parser;

/// Sync a Vault secret into a Kubernetes Secret or ConfigMap
#[derive(Parser, Default)]
#[command(name = "vault-k8s-sync", version, about, long_about = None)]
pub struct Cli {
    /// Vault base URL [env: VAULT_ADDRESS]
    #[arg(long)]
    pub vault_address: Option<String>,

    /// Auth method: token, approle or github [env: VAULT_AUTH_METHOD]
    #[arg(long)]
    pub vault_auth_method: Option<String>,

    /// Vault token for the token method [env: VAULT_TOKEN]
    #[arg(long)]
    pub vault_token: Option<String>,

    /// AppRole role id [env: VAULT_APPROLE_ID]
    #[arg(long)]
    pub vault_approle_id: Option<String>,

    /// AppRole secret id [env: VAULT_APPROLE_SECRET_ID]
    #[arg(long)]
    pub vault_approle_secret_id: Option<String>,

    /// GitHub token for the github method [env: GITHUB_TOKEN]
    #[arg(long)]
    pub github_token: Option<String>,

    /// Vault namespace [env: VAULT_NAMESPACE]
    #[arg(long)]
    pub vault_namespace: Option<String>,

    /// Secrets engine mount name [env: VAULT_ENGINE]
    #[arg(long)]
    pub vault_engine: Option<String>,

    /// Secret path inside the engine [env: VAULT_SECRET_PATH]
    #[arg(long)]
    pub vault_secret_path: Option<String>,

    /// Base64-encoded kubeconfig of the target cluster [env: KUBECONFIG]
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Namespace to write into [env: KUBERNETES_NAMESPACE]
    #[arg(long)]
    pub kubernetes_namespace: Option<String>,

    /// Write a ConfigMap instead of a Secret [env: LOAD_AS_CONFIGMAP]
    #[arg(long)]
    pub load_as_configmap: bool,

    /// Name of the object to write [env: OBJECT_NAME_TO_APPLY]
    #[arg(long = "object-name")]
    pub object_name: Option<String>,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("vault_address", &self.vault_address)
            .field("vault_auth_method", &self.vault_auth_method)
            .field("vault_namespace", &self.vault_namespace)
            .field("vault_engine", &self.vault_engine)
            .field("vault_secret_path", &self.vault_secret_path)
            .field("kubernetes_namespace", &self.kubernetes_namespace)
            .field("load_as_configmap", &self.load_as_configmap)
            .field("object_name", &self.object_name)
            .finish_non_exhaustive()
    }
}

impl Cli {
    /// Overlay the flags that were given onto `source`
    pub fn apply_to(self, source: &mut ConfigSource) {
        let overrides = [
            (env::VAULT_ADDRESS, self.vault_address),
            (env::VAULT_AUTH_METHOD, self.vault_auth_method),
            (env::VAULT_TOKEN, self.vault_token),
            (env::VAULT_APPROLE_ID, self.vault_approle_id),
            (env::VAULT_APPROLE_SECRET_ID, self.vault_approle_secret_id),
            (env::GITHUB_TOKEN, self.github_token),
            (env::VAULT_NAMESPACE, self.vault_namespace),
            (env::VAULT_ENGINE, self.vault_engine),
            (env::VAULT_SECRET_PATH, self.vault_secret_path),
            (env::KUBECONFIG, self.kubeconfig),
            (env::KUBERNETES_NAMESPACE, self.kubernetes_namespace),
            (env::OBJECT_NAME_TO_APPLY, self.object_name),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                source.set(key, value);
            }
        }
        if self.load_as_configmap {
            source.set(env::LOAD_AS_CONFIGMAP, "true");
        }
    }
}
