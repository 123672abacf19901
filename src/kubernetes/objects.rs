//! # Secret and ConfigMap objects
//!
//! Conversion between [`StoredObject`] and the typed k8s-openapi resources, plus
//! the [`ObjectStore`] implementation backed by a kube [`Client`].

use super::{ObjectStore, StoredObject};
use crate::config::ObjectKind;
use crate::constants::PROVENANCE_LABEL_VALUE;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::PostParams;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, info_span, Instrument};

/// Secret type written by this tool
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn metadata(object: &StoredObject) -> ObjectMeta {
    ObjectMeta {
        name: Some(object.name.clone()),
        namespace: Some(object.namespace.clone()),
        labels: Some(object.labels.clone()),
        annotations: (!object.annotations.is_empty()).then(|| object.annotations.clone()),
        finalizers: non_empty(&object.finalizers),
        owner_references: non_empty(&object.owner_references),
        resource_version: object.resource_version.clone(),
        ..Default::default()
    }
}

/// Build an `Opaque` Secret carrying `object.data`
#[must_use]
pub fn build_secret(object: &StoredObject) -> Secret {
    Secret {
        metadata: metadata(object),
        type_: Some(SECRET_TYPE_OPAQUE.to_string()),
        data: Some(
            object
                .data
                .iter()
                .map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

/// Build a ConfigMap carrying `object.data`
#[must_use]
pub fn build_config_map(object: &StoredObject) -> ConfigMap {
    ConfigMap {
        metadata: metadata(object),
        data: Some(object.data.clone()),
        ..Default::default()
    }
}

fn stored(kind: ObjectKind, meta: ObjectMeta, data: BTreeMap<String, String>) -> StoredObject {
    StoredObject {
        kind,
        name: meta.name.unwrap_or_default(),
        namespace: meta.namespace.unwrap_or_default(),
        labels: meta.labels.unwrap_or_default(),
        annotations: meta.annotations.unwrap_or_default(),
        finalizers: meta.finalizers.unwrap_or_default(),
        owner_references: meta.owner_references.unwrap_or_default(),
        data,
        resource_version: meta.resource_version,
    }
}

/// View a Secret as a [`StoredObject`]
///
/// Values that are not valid UTF-8 are decoded lossily; they can never equal a
/// payload value so the object is rewritten.
#[must_use]
pub fn secret_to_stored(secret: Secret) -> StoredObject {
    let mut data: BTreeMap<String, String> = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, String::from_utf8_lossy(&v.0).into_owned()))
        .collect();
    // stringData is write-only on the server but may appear on hand-built objects
    if let Some(string_data) = secret.string_data {
        data.extend(string_data);
    }
    stored(ObjectKind::Secret, secret.metadata, data)
}

/// View a ConfigMap as a [`StoredObject`]
#[must_use]
pub fn config_map_to_stored(config_map: ConfigMap) -> StoredObject {
    stored(
        ObjectKind::ConfigMap,
        config_map.metadata,
        config_map.data.unwrap_or_default(),
    )
}

/// [`ObjectStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
    namespace: String,
}

impl std::fmt::Debug for KubeObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeObjectStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl KubeObjectStore {
    #[must_use]
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
        }
    }

    fn secrets(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn config_maps(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(PROVENANCE_LABEL_VALUE.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, kind: ObjectKind, name: &str) -> Result<Option<StoredObject>> {
        let span = info_span!("kube.get", kind = kind.as_str(), name = name);

        async move {
            let found = match kind {
                ObjectKind::Secret => self
                    .secrets()
                    .get_opt(name)
                    .await
                    .with_context(|| format!("failed to get Secret {name}"))?
                    .map(secret_to_stored),
                ObjectKind::ConfigMap => self
                    .config_maps()
                    .get_opt(name)
                    .await
                    .with_context(|| format!("failed to get ConfigMap {name}"))?
                    .map(config_map_to_stored),
            };
            debug!(exists = found.is_some(), "Looked up existing object");
            Ok(found)
        }
        .instrument(span)
        .await
    }

    async fn create(&self, object: &StoredObject) -> Result<()> {
        let span = info_span!("kube.create", kind = object.kind.as_str(), name = %object.name);

        async move {
            match object.kind {
                ObjectKind::Secret => {
                    self.secrets()
                        .create(&Self::post_params(), &build_secret(object))
                        .await
                        .with_context(|| format!("failed to create Secret {}", object.name))?;
                }
                ObjectKind::ConfigMap => {
                    self.config_maps()
                        .create(&Self::post_params(), &build_config_map(object))
                        .await
                        .with_context(|| format!("failed to create ConfigMap {}", object.name))?;
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn replace(&self, object: &StoredObject) -> Result<()> {
        let span = info_span!("kube.replace", kind = object.kind.as_str(), name = %object.name);

        async move {
            match object.kind {
                ObjectKind::Secret => {
                    self.secrets()
                        .replace(&object.name, &Self::post_params(), &build_secret(object))
                        .await
                        .with_context(|| format!("failed to replace Secret {}", object.name))?;
                }
                ObjectKind::ConfigMap => {
                    self.config_maps()
                        .replace(&object.name, &Self::post_params(), &build_config_map(object))
                        .await
                        .with_context(|| format!("failed to replace ConfigMap {}", object.name))?;
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}
