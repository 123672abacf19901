//! # Sync Orchestrator
//!
//! Runs one pass: validate → authenticate → fetch → resolve → reconcile.
//!
//! Each stage is awaited before the next one starts and the first failure
//! ends the pass. The cluster descriptor is decoded up front so a broken
//! kubeconfig never costs a Vault login. The backend and cluster capabilities are injected so the
//! whole pipeline can run against in-memory doubles.

use crate::config::{ConfigSource, ObjectKind, RuntimeConfig, SyncConfig};
use crate::error::SyncError;
use crate::kubernetes::resolver::{check_target, decode_kubeconfig};
use crate::kubernetes::{reconcile, ApplyRequest, ClusterResolver, KubeResolver, ReconcileAction};
use crate::vault::{authenticate, fetch, BackendConnector, HttpConnector};
use std::fmt;
use tracing::{info, info_span, Instrument};

/// Result of a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub kind: ObjectKind,
    pub name: String,
    pub namespace: String,
    pub action: ReconcileAction,
    pub entries: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} {} ({} entries)",
            self.kind, self.namespace, self.name, self.action, self.entries
        )
    }
}

/// Wires a [`BackendConnector`] and a [`ClusterResolver`] into one sync pass
#[derive(Debug, Clone)]
pub struct SyncOrchestrator<C = HttpConnector, R = KubeResolver> {
    connector: C,
    resolver: R,
}

impl Default for SyncOrchestrator {
    fn default() -> Self {
        Self::new(HttpConnector::default(), KubeResolver::default())
    }
}

impl SyncOrchestrator {
    /// Real HTTP and kube implementations using the configured deadlines
    #[must_use]
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        Self::new(
            HttpConnector::new(runtime.vault_request_timeout()),
            KubeResolver::new(runtime.kube_connect_timeout(), runtime.kube_read_timeout()),
        )
    }
}

impl<C: BackendConnector, R: ClusterResolver> SyncOrchestrator<C, R> {
    #[must_use]
    pub fn new(connector: C, resolver: R) -> Self {
        Self {
            connector,
            resolver,
        }
    }

    /// Validate `source` and run a pass with it
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] before any network call if validation fails,
    /// otherwise the error of the first failing stage.
    pub async fn run(&self, source: &ConfigSource) -> Result<SyncReport, SyncError> {
        let config = SyncConfig::from_source(source)?;
        self.sync(config).await
    }

    /// Run a pass with an already validated configuration
    ///
    /// # Errors
    /// Returns the error of the first failing stage.
    pub async fn sync(&self, config: SyncConfig) -> Result<SyncReport, SyncError> {
        let span = info_span!(
            "sync",
            vault.engine = %config.backend.engine_name,
            vault.path = %config.backend.secret_path,
            kind = config.object_kind.as_str(),
            name = %config.object_name,
            namespace = %config.cluster.namespace
        );

        async move {
            let backend = &config.backend;

            check_target(&config.cluster)?;
            decode_kubeconfig(&config.cluster.kubeconfig)?;

            let api = self
                .connector
                .connect(&backend.address, backend.namespace.as_deref())?;
            let handle = authenticate(api, &backend.credentials).await?;

            let payload = fetch(&handle, &backend.engine_name, &backend.secret_path).await?;

            let store = self.resolver.resolve(&config.cluster).await?;

            let request = ApplyRequest {
                kind: config.object_kind,
                name: config.object_name.clone(),
                namespace: config.cluster.namespace.clone(),
                payload,
            };
            let action = reconcile(&store, &request).await?;

            let report = SyncReport {
                kind: request.kind,
                name: request.name,
                namespace: request.namespace,
                action,
                entries: request.payload.len(),
            };
            info!(action = action.as_str(), entries = report.entries, "Sync complete");
            Ok(report)
        }
        .instrument(span)
        .await
    }
}
