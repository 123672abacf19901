//! # Reconciliation
//!
//! Check-then-write for a single object:
//!
//! 1. `get` the object by kind and name
//! 2. absent: `create` it
//! 3. present with the same entries and the provenance label: leave it alone
//! 4. otherwise: full `replace` carrying the observed `resourceVersion`
//!
//! Entries are always replaced as a whole, never merged. Labels, annotations,
//! finalizers and owner references set by other tools survive a replace.

use super::{ApplyRequest, ObjectStore, StoredObject};
use crate::constants::{PROVENANCE_LABEL_KEY, PROVENANCE_LABEL_VALUE};
use crate::error::ReconcileError;
use std::fmt;
use tracing::{info, info_span, Instrument};

/// What reconciliation did to the target object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
    Unchanged,
}

impl ReconcileAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileAction::Created => "created",
            ReconcileAction::Updated => "updated",
            ReconcileAction::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_up_to_date(existing: &StoredObject, request: &ApplyRequest) -> bool {
    existing.data == request.payload
        && existing.labels.get(PROVENANCE_LABEL_KEY).map(String::as_str)
            == Some(PROVENANCE_LABEL_VALUE)
}

/// Create or replace the object described by `request` so it holds exactly `request.payload`
///
/// # Errors
/// Returns [`ReconcileError::Write`] if reading or writing the object fails.
pub async fn reconcile<S: ObjectStore + ?Sized>(
    store: &S,
    request: &ApplyRequest,
) -> Result<ReconcileAction, ReconcileError> {
    let kind = request.kind.as_str();
    let span = info_span!(
        "kube.reconcile",
        kind = kind,
        name = %request.name,
        namespace = %request.namespace
    );

    async {
        let wrap = |source: anyhow::Error| ReconcileError::Write {
            kind,
            namespace: request.namespace.clone(),
            name: request.name.clone(),
            source,
        };

        let existing = store.get(request.kind, &request.name).await.map_err(wrap)?;

        let action = match existing {
            None => {
                let desired = StoredObject {
                    kind: request.kind,
                    name: request.name.clone(),
                    namespace: request.namespace.clone(),
                    labels: [(
                        PROVENANCE_LABEL_KEY.to_string(),
                        PROVENANCE_LABEL_VALUE.to_string(),
                    )]
                    .into(),
                    data: request.payload.clone(),
                    ..Default::default()
                };
                store.create(&desired).await.map_err(wrap)?;
                ReconcileAction::Created
            }
            Some(existing) if is_up_to_date(&existing, request) => ReconcileAction::Unchanged,
            Some(existing) => {
                let mut desired = existing;
                desired.labels.insert(
                    PROVENANCE_LABEL_KEY.to_string(),
                    PROVENANCE_LABEL_VALUE.to_string(),
                );
                desired.data = request.payload.clone();
                store.replace(&desired).await.map_err(wrap)?;
                ReconcileAction::Updated
            }
        };

        info!(
            action = action.as_str(),
            entries = request.payload.len(),
            "Reconciled {kind}"
        );
        Ok(action)
    }
    .instrument(span)
    .await
}
