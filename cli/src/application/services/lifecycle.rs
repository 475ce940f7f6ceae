//! Pod lifecycle operations: create, delete, status.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use chrono::Utc;
use tracing::{debug, info};

use crate::application::ports::{Deletion, WorkloadApi};
use crate::application::services::cleanup::ResourceRegistry;
use crate::domain::{
    CleanupWarning, LifecyclePhase, PocketError, ResourceHandle, ResourceSpec, StatusSnapshot,
};

/// Submit `spec` and start tracking the resulting pod in `registry`.
///
/// The pod carries the ownership labels; the adapter applies them.
///
/// # Errors
///
/// Returns [`PocketError::Create`] if the API rejects the pod (invalid
/// image reference, quota, name already taken).
pub async fn create(
    api: &impl WorkloadApi,
    spec: ResourceSpec,
    registry: &ResourceRegistry,
) -> Result<ResourceHandle, PocketError> {
    debug!(pod = %spec.name, namespace = %spec.namespace, image = %spec.image, "creating pod");
    api.create_pod(&spec)
        .await
        .map_err(|e| PocketError::Create {
            name: spec.name.clone(),
            reason: format!("{e:#}"),
        })?;
    let handle = ResourceHandle::created(spec, Utc::now());
    registry.track(&handle);
    info!(pod = %handle, "pod created");
    Ok(handle)
}

/// Delete the pod behind `handle`.
///
/// Idempotent: a pod that is already gone is not an error.
///
/// # Errors
///
/// Returns a [`CleanupWarning`] when the API refuses or cannot be reached.
/// Callers report it and carry on.
pub async fn delete(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
) -> Result<Deletion, CleanupWarning> {
    match api.delete_pod(handle.namespace(), handle.name()).await {
        Ok(Deletion::Deleted) => {
            info!(pod = %handle, "pod deleted");
            Ok(Deletion::Deleted)
        }
        Ok(Deletion::NotFound) => {
            debug!(pod = %handle, "pod already gone");
            Ok(Deletion::NotFound)
        }
        Err(e) => Err(CleanupWarning {
            namespace: handle.namespace().to_string(),
            name: handle.name().to_string(),
            reason: format!("{e:#}"),
        }),
    }
}

/// Read the current status of the pod behind `handle`.
///
/// A pod that is not visible yet reads as `Pending`: creation was accepted,
/// the object just has not propagated.
///
/// # Errors
///
/// Returns [`PocketError::TransientRead`] if the status cannot be read.
pub async fn get_status(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
) -> Result<StatusSnapshot, PocketError> {
    match api.pod_status(handle.namespace(), handle.name()).await {
        Ok(Some(snapshot)) => Ok(snapshot),
        Ok(None) => Ok(StatusSnapshot::with_phase(LifecyclePhase::Pending)),
        Err(e) => Err(PocketError::TransientRead {
            name: handle.name().to_string(),
            reason: format!("{e:#}"),
        }),
    }
}
