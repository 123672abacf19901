//! # Secret Fetch
//!
//! Reads `<engine>/data/<path>` and flattens the response into a [`SecretPayload`].
//!
//! Two response shapes are accepted:
//!
//! - versioned (KV v2): `{"data": {"data": {K: V}, "metadata": {...}}}`
//! - flat (KV v1 style): `{"data": {K: V}}`
//!
//! A read that comes back empty is ambiguous: the path may simply hold no
//! secrets yet, or the engine may not be mounted at all. The mount table
//! decides which. A versioned envelope whose latest version was deleted or
//! destroyed (`"data": null` next to `metadata`) counts as empty.

use super::auth::Authenticated;
use super::{SecretPayload, VaultApi, VaultApiError};
use crate::constants::VAULT_MOUNTS_PATH;
use crate::error::FetchError;
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};

/// Read path for a secret in a versioned engine
#[must_use]
pub fn secret_read_path(engine: &str, path: &str) -> String {
    format!(
        "{}/data/{}",
        engine.trim_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Flatten a read response into a [`SecretPayload`]
///
/// Returns `None` when the response has no usable `data` container, including
/// a versioned envelope without a current version.
#[must_use]
pub fn normalize_payload(response: &Value) -> Option<SecretPayload> {
    let data = response.get("data").filter(|d| !d.is_null())?;

    let entries = match data.get("data") {
        Some(Value::Object(inner)) => inner,
        _ if is_versioned_envelope(data) => return None,
        _ => data.as_object()?,
    };

    Some(
        entries
            .iter()
            .map(|(key, value)| (key.clone(), normalize_value(value)))
            .collect(),
    )
}

/// True when `data` is a KV v2 envelope rather than a flat secret
///
/// Envelope fields must never be written out as secret entries.
fn is_versioned_envelope(data: &Value) -> bool {
    data.get("data").is_some_and(Value::is_null)
        || data
            .get("metadata")
            .and_then(|metadata| metadata.get("version"))
            .is_some()
}

/// True for a versioned envelope whose latest version holds no data
fn is_deleted_version(response: &Value) -> bool {
    response
        .get("data")
        .filter(|d| !d.is_null())
        .is_some_and(|data| {
            !data.get("data").is_some_and(Value::is_object) && is_versioned_envelope(data)
        })
}

fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        // Numbers and booleans render as their display form, containers as compact JSON
        other => other.to_string(),
    }
}

/// Fetch the secret at `path` inside `engine`
///
/// # Errors
/// - [`FetchError::EngineNotFound`] if the read is empty and the engine is not mounted
/// - [`FetchError::MalformedPayload`] if the response carries no `data` container
/// - [`FetchError::Backend`] / [`FetchError::Transport`] for HTTP and network failures
pub async fn fetch<A: VaultApi>(
    handle: &Authenticated<A>,
    engine: &str,
    path: &str,
) -> Result<SecretPayload, FetchError> {
    let read_path = secret_read_path(engine, path);
    let span = info_span!("vault.fetch", vault.engine = engine, vault.path = %read_path);

    async {
        let api = handle.api();

        let response = api
            .read(&read_path)
            .await
            .map_err(|e| map_api_error(&read_path, e))?;

        if response.as_ref().is_some_and(is_deleted_version) {
            info!("Latest secret version is deleted or destroyed");
        }
        let Some(response) = response.filter(|r| !is_deleted_version(r)) else {
            if engine_mounted(api, engine).await? {
                info!("Vault path holds no secrets yet, using empty payload");
                return Ok(SecretPayload::new());
            }
            return Err(FetchError::EngineNotFound {
                engine: engine.to_string(),
            });
        };

        let payload = normalize_payload(&response).ok_or_else(|| FetchError::MalformedPayload {
            path: read_path.clone(),
        })?;

        info!(entries = payload.len(), "Loaded secret data");
        Ok(payload)
    }
    .instrument(span)
    .await
}

/// Check the mount table for `<engine>/`
///
/// A rejected mount listing (e.g. the token lacks `sys/mounts` read) counts as
/// "not mounted". Transport failures still propagate.
async fn engine_mounted<A: VaultApi>(api: &A, engine: &str) -> Result<bool, FetchError> {
    let mount = format!("{}/", engine.trim_matches('/'));

    let mounts = match api.read(VAULT_MOUNTS_PATH).await {
        Ok(Some(mounts)) => mounts,
        Ok(None) => return Ok(false),
        Err(VaultApiError::Status { status, message }) => {
            warn!(
                status = status,
                error = %message,
                "Failed to fetch Vault secret engine mounts"
            );
            return Ok(false);
        }
        Err(e) => return Err(map_api_error(VAULT_MOUNTS_PATH, e)),
    };

    // Newer servers duplicate the table under "data"
    let listed = mounts.get(mount.as_str()).is_some()
        || mounts
            .get("data")
            .and_then(|d| d.get(mount.as_str()))
            .is_some();
    Ok(listed)
}

fn map_api_error(path: &str, err: VaultApiError) -> FetchError {
    match err {
        VaultApiError::Transport(source) => FetchError::Transport {
            path: path.to_string(),
            source,
        },
        VaultApiError::Status { status, message } => FetchError::Backend {
            path: path.to_string(),
            status,
            message,
        },
        VaultApiError::Decode(reason) => FetchError::InvalidResponse {
            path: path.to_string(),
            reason,
        },
    }
}
