//! # Cluster Resolver
//!
//! Decodes the base64 kubeconfig handed to the job and builds a kube client
//! for its current context, bound to the target namespace.

use super::{ClusterResolver, KubeObjectStore};
use crate::config::ClusterTarget;
use crate::constants::{DEFAULT_KUBE_CONNECT_TIMEOUT_SECS, DEFAULT_KUBE_READ_TIMEOUT_SECS};
use crate::error::ResolveError;
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::time::Duration;
use tracing::{debug, info};

/// Resolver backed by a real kube [`Client`]
#[derive(Debug, Clone)]
pub struct KubeResolver {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl KubeResolver {
    #[must_use]
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    /// Build a client from a decoded kubeconfig
    ///
    /// # Errors
    /// Returns [`ResolveError::DecodeFailure`] if the kubeconfig has no usable context.
    pub async fn client_for(&self, kubeconfig: Kubeconfig) -> Result<Client, ResolveError> {
        let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("failed to load kubeconfig")
            .map_err(ResolveError::DecodeFailure)?;

        config.connect_timeout = Some(self.connect_timeout);
        config.read_timeout = Some(self.read_timeout);

        debug!(cluster.url = %config.cluster_url, "Building kube client");

        Client::try_from(config)
            .context("failed to create client")
            .map_err(ResolveError::DecodeFailure)
    }
}

impl Default for KubeResolver {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_KUBE_CONNECT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_KUBE_READ_TIMEOUT_SECS),
        )
    }
}

#[async_trait]
impl ClusterResolver for KubeResolver {
    type Store = KubeObjectStore;

    async fn resolve(&self, target: &ClusterTarget) -> Result<KubeObjectStore, ResolveError> {
        check_target(target)?;

        let kubeconfig = decode_kubeconfig(&target.kubeconfig)?;
        let client = self.client_for(kubeconfig).await?;

        info!(namespace = %target.namespace, "Resolved target cluster");
        Ok(KubeObjectStore::new(client, &target.namespace))
    }
}

/// Reject an empty descriptor or namespace before any decoding
///
/// # Errors
/// [`ResolveError::EmptyDescriptor`] or [`ResolveError::EmptyGrouping`].
pub fn check_target(target: &ClusterTarget) -> Result<(), ResolveError> {
    if target.kubeconfig.trim().is_empty() {
        return Err(ResolveError::EmptyDescriptor);
    }
    if target.namespace.trim().is_empty() {
        return Err(ResolveError::EmptyGrouping);
    }
    Ok(())
}

/// Decode a base64 (standard alphabet) kubeconfig document
///
/// # Errors
/// Returns [`ResolveError::DecodeFailure`] if the input is not base64, not
/// UTF-8, or not a kubeconfig.
pub fn decode_kubeconfig(descriptor: &str) -> Result<Kubeconfig, ResolveError> {
    let bytes = STANDARD
        .decode(descriptor.trim())
        .context("kubeconfig is not valid base64")
        .map_err(ResolveError::DecodeFailure)?;

    let text = String::from_utf8(bytes)
        .context("kubeconfig is not valid UTF-8")
        .map_err(ResolveError::DecodeFailure)?;

    Kubeconfig::from_yaml(&text)
        .context("failed to parse kubeconfig")
        .map_err(ResolveError::DecodeFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r"apiVersion: v1
kind: Config
clusters:
- name: test
  cluster:
    server: https://example.com
contexts:
- name: test
  context:
    cluster: test
    user: test
current-context: test
users:
- name: test
  user:
    token: fake-token
";

    fn target(kubeconfig: &str, namespace: &str) -> ClusterTarget {
        ClusterTarget {
            kubeconfig: kubeconfig.to_string(),
            namespace: namespace.to_string(),
        }
    }

    #[test]
    fn test_empty_descriptor_checked_first() {
        assert!(matches!(
            check_target(&target("", "")),
            Err(ResolveError::EmptyDescriptor)
        ));
        assert!(matches!(
            check_target(&target("  ", "test-namespace")),
            Err(ResolveError::EmptyDescriptor)
        ));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        assert!(matches!(
            check_target(&target("Zm9v", "")),
            Err(ResolveError::EmptyGrouping)
        ));
    }

    #[test]
    fn test_decode_valid_kubeconfig() {
        let encoded = format!("{}\n", STANDARD.encode(KUBECONFIG));
        let kubeconfig = decode_kubeconfig(&encoded).unwrap();

        assert_eq!(kubeconfig.current_context.as_deref(), Some("test"));
        assert_eq!(kubeconfig.clusters.len(), 1);
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        let err = decode_kubeconfig("not base64 at all!").unwrap_err();
        assert!(matches!(err, ResolveError::DecodeFailure(_)));
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0xfd]);
        let err = decode_kubeconfig(&encoded).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_decode_rejects_non_kubeconfig_yaml() {
        let encoded = STANDARD.encode("clusters: [unterminated");
        let err = decode_kubeconfig(&encoded).unwrap_err();
        assert!(err.to_string().contains("failed to parse kubeconfig"));
    }
}
