//! # Kubernetes
//!
//! Writes a [`SecretPayload`] into the target cluster.
//!
//! - [`resolver`] - turns a base64 kubeconfig + namespace into an [`ObjectStore`]
//! - [`objects`] - `Secret` / `ConfigMap` builders and the kube-backed store
//! - [`reconcile`] - check-then-write logic producing a [`ReconcileAction`]

use crate::config::{ClusterTarget, ObjectKind};
use crate::error::ResolveError;
use crate::vault::SecretPayload;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use std::collections::BTreeMap;

pub mod objects;
pub mod reconcile;
pub mod resolver;

pub use objects::KubeObjectStore;
pub use reconcile::{reconcile, ReconcileAction};
pub use resolver::KubeResolver;

/// One object to write: kind, name, namespace and its entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRequest {
    pub kind: ObjectKind,
    pub name: String,
    pub namespace: String,
    pub payload: SecretPayload,
}

/// Kind-agnostic view of a `Secret` or `ConfigMap` as stored in the cluster
///
/// `data` holds decoded string values for both kinds. Annotations, finalizers
/// and owner references belong to other controllers and are written back as read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub finalizers: Vec<String>,
    pub owner_references: Vec<OwnerReference>,
    pub data: BTreeMap<String, String>,
    pub resource_version: Option<String>,
}

/// Namespaced read/write access to `Secret` and `ConfigMap` objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Namespace every call is scoped to
    fn namespace(&self) -> &str;

    /// Fetch an object, `None` if it does not exist
    async fn get(&self, kind: ObjectKind, name: &str) -> anyhow::Result<Option<StoredObject>>;

    async fn create(&self, object: &StoredObject) -> anyhow::Result<()>;

    /// Full replace (PUT). `object.resource_version` guards against concurrent writers.
    async fn replace(&self, object: &StoredObject) -> anyhow::Result<()>;
}

/// Produces an [`ObjectStore`] for a [`ClusterTarget`]
#[async_trait]
pub trait ClusterResolver: Send + Sync {
    type Store: ObjectStore;

    /// # Errors
    /// Returns a [`ResolveError`] if the target is empty or cannot be decoded.
    async fn resolve(&self, target: &ClusterTarget) -> Result<Self::Store, ResolveError>;
}
