//! Common test utilities for integration and Pact tests
//!
//! Provides rustls setup, a fake kubeconfig, and in-memory doubles for the
//! Vault backend and the target cluster.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use vault_k8s_sync::config::{ClusterTarget, ObjectKind};
use vault_k8s_sync::error::{AuthError, ResolveError};
use vault_k8s_sync::kubernetes::resolver::{check_target, decode_kubeconfig};
use vault_k8s_sync::kubernetes::{ClusterResolver, ObjectStore, StoredObject};
use vault_k8s_sync::vault::{BackendConnector, VaultApi, VaultApiError};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// This must be called before any async operations that use rustls.
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // We use ring as the crypto provider (matches main application)
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub const FAKE_KUBECONFIG: &str = r"apiVersion: v1
kind: Config
clusters:
- name: test-cluster
  cluster:
    server: https://example.com
contexts:
- name: test-context
  context:
    cluster: test-cluster
    user: test-user
current-context: test-context
users:
- name: test-user
  user:
    token: fake-token
";

/// Base64 encoding of [`FAKE_KUBECONFIG`]
pub fn fake_kubeconfig_b64() -> String {
    STANDARD.encode(FAKE_KUBECONFIG)
}

// ---------------------------------------------------------------------------
// Vault double
// ---------------------------------------------------------------------------

/// Canned Vault responses keyed by API path, shared by every client a
/// [`ScriptedConnector`] hands out
#[derive(Default)]
pub struct ScriptedBackend {
    pub reads: HashMap<String, Value>,
    pub writes: HashMap<String, Value>,
    pub calls: AtomicUsize,
    pub connects: AtomicUsize,
    pub seen_tokens: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn with_read(mut self, path: &str, body: Value) -> Self {
        self.reads.insert(path.to_string(), body);
        self
    }

    pub fn with_write(mut self, path: &str, body: Value) -> Self {
        self.writes.insert(path.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

pub struct ScriptedVault {
    backend: Arc<ScriptedBackend>,
    namespace: Option<String>,
    token: Option<String>,
}

#[async_trait]
impl VaultApi for ScriptedVault {
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, VaultApiError> {
        self.backend.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.token {
            self.backend.seen_tokens.lock().unwrap().push(token.clone());
        }
        Ok(self.backend.reads.get(path).cloned())
    }

    async fn write(&self, path: &str, _body: Value) -> Result<Option<Value>, VaultApiError> {
        self.backend.calls.fetch_add(1, Ordering::SeqCst);
        match self.backend.writes.get(path) {
            Some(body) => Ok(Some(body.clone())),
            None => Err(VaultApiError::Status {
                status: 404,
                message: format!("no handler for route \"{path}\""),
            }),
        }
    }
}

#[derive(Clone)]
pub struct ScriptedConnector {
    pub backend: Arc<ScriptedBackend>,
}

impl ScriptedConnector {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

impl BackendConnector for ScriptedConnector {
    type Api = ScriptedVault;

    fn connect(&self, _address: &str, namespace: Option<&str>) -> Result<ScriptedVault, AuthError> {
        self.backend.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedVault {
            backend: Arc::clone(&self.backend),
            namespace: namespace.map(ToString::to_string),
            token: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Cluster double
// ---------------------------------------------------------------------------

type ObjectKey = (&'static str, String, String);

/// In-memory API server shared by every store a [`MemoryCluster`] resolves
#[derive(Default)]
pub struct MemoryApiServer {
    objects: Mutex<BTreeMap<ObjectKey, StoredObject>>,
    next_version: AtomicUsize,
    pub writes: AtomicUsize,
    pub resolves: AtomicUsize,
}

impl MemoryApiServer {
    pub fn object(&self, kind: ObjectKind, namespace: &str, name: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(kind.as_str(), namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn insert(&self, object: StoredObject) {
        let key = (object.kind.as_str(), object.namespace.clone(), object.name.clone());
        self.objects.lock().unwrap().insert(key, object);
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    fn bump(&self) -> String {
        (self.next_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[derive(Clone, Default)]
pub struct MemoryCluster {
    pub server: Arc<MemoryApiServer>,
}

pub struct MemoryStore {
    server: Arc<MemoryApiServer>,
    namespace: String,
}

#[async_trait]
impl ClusterResolver for MemoryCluster {
    type Store = MemoryStore;

    async fn resolve(&self, target: &ClusterTarget) -> Result<MemoryStore, ResolveError> {
        self.server.resolves.fetch_add(1, Ordering::SeqCst);
        check_target(target)?;
        decode_kubeconfig(&target.kubeconfig)?;
        Ok(MemoryStore {
            server: Arc::clone(&self.server),
            namespace: target.namespace.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, kind: ObjectKind, name: &str) -> anyhow::Result<Option<StoredObject>> {
        Ok(self.server.object(kind, &self.namespace, name))
    }

    async fn create(&self, object: &StoredObject) -> anyhow::Result<()> {
        if self.server.object(object.kind, &self.namespace, &object.name).is_some() {
            anyhow::bail!("{} \"{}\" already exists", object.kind, object.name);
        }
        let mut stored = object.clone();
        stored.namespace = self.namespace.clone();
        stored.resource_version = Some(self.server.bump());
        self.server.insert(stored);
        self.server.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn replace(&self, object: &StoredObject) -> anyhow::Result<()> {
        let current = self
            .server
            .object(object.kind, &self.namespace, &object.name)
            .ok_or_else(|| anyhow::anyhow!("{} \"{}\" not found", object.kind, object.name))?;
        if current.resource_version != object.resource_version {
            anyhow::bail!(
                "Operation cannot be fulfilled on {} \"{}\": the object has been modified",
                object.kind,
                object.name
            );
        }
        let mut stored = object.clone();
        stored.namespace = self.namespace.clone();
        stored.resource_version = Some(self.server.bump());
        self.server.insert(stored);
        self.server.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
