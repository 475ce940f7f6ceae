//! Release of created pods on every exit path.
//!
//! [`ResourceRegistry`] records what this invocation created and hands out
//! each deletion exactly once. [`CleanupGuard`] ties one pod to a scope:
//! release it explicitly on the normal path; if the guard is dropped while
//! still armed (panic, cancelled future) a background deletion is spawned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::application::ports::WorkloadApi;
use crate::application::services::lifecycle;
use crate::domain::{CleanupWarning, ResourceHandle};

/// One pod created during this invocation.
#[derive(Debug, Clone)]
pub struct TrackedResource {
    pub handle: ResourceHandle,
    pub created_at: DateTime<Utc>,
    pub released: bool,
}

/// Process-wide record of created pods.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: Mutex<Vec<TrackedResource>>,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<TrackedResource>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking `handle`.
    pub fn track(&self, handle: &ResourceHandle) {
        self.entries().push(TrackedResource {
            handle: handle.clone(),
            created_at: handle.created_at(),
            released: false,
        });
    }

    /// Mark `handle` as released. Returns `true` only for the first caller,
    /// which then owns the deletion. Untracked handles are never claimed.
    pub fn claim(&self, handle: &ResourceHandle) -> bool {
        let mut entries = self.entries();
        match entries
            .iter_mut()
            .find(|e| e.handle.namespace() == handle.namespace() && e.handle.name() == handle.name())
        {
            Some(entry) if !entry.released => {
                entry.released = true;
                true
            }
            _ => false,
        }
    }

    /// Pods created but not yet released.
    #[must_use]
    pub fn outstanding(&self) -> Vec<ResourceHandle> {
        self.entries()
            .iter()
            .filter(|e| !e.released)
            .map(|e| e.handle.clone())
            .collect()
    }

    /// Snapshot of every tracked pod.
    #[must_use]
    pub fn tracked(&self) -> Vec<TrackedResource> {
        self.entries().clone()
    }

    /// Delete every outstanding pod, each within `budget`.
    ///
    /// Last line of defence before the process exits.
    pub async fn sweep(
        &self,
        api: &impl WorkloadApi,
        budget: Duration,
    ) -> Vec<CleanupWarning> {
        let mut warnings = Vec::new();
        for handle in self.outstanding() {
            if let Some(warning) = release(api, self, &handle, budget).await {
                warnings.push(warning);
            }
        }
        warnings
    }
}

/// Delete `handle` if nobody else has, bounded by `budget`.
///
/// Uses its own deadline so it still runs after the operation that created
/// the pod was cancelled.
pub async fn release(
    api: &impl WorkloadApi,
    registry: &ResourceRegistry,
    handle: &ResourceHandle,
    budget: Duration,
) -> Option<CleanupWarning> {
    if !registry.claim(handle) {
        debug!(pod = %handle, "pod already released");
        return None;
    }
    match tokio::time::timeout(budget, lifecycle::delete(api, handle)).await {
        Ok(Ok(_)) => None,
        Ok(Err(warning)) => Some(warning),
        Err(_) => Some(CleanupWarning {
            namespace: handle.namespace().to_string(),
            name: handle.name().to_string(),
            reason: format!("deletion did not finish within {}s", budget.as_secs()),
        }),
    }
}

/// Scope guard for one created pod.
pub struct CleanupGuard<A>
where
    A: WorkloadApi + Send + Sync + 'static,
{
    api: Arc<A>,
    registry: Arc<ResourceRegistry>,
    handle: ResourceHandle,
    budget: Duration,
    armed: bool,
}

impl<A> CleanupGuard<A>
where
    A: WorkloadApi + Send + Sync + 'static,
{
    /// Arm a guard for `handle`, which must already be tracked in `registry`.
    pub fn arm(
        api: Arc<A>,
        registry: Arc<ResourceRegistry>,
        handle: ResourceHandle,
        budget: Duration,
    ) -> Self {
        Self {
            api,
            registry,
            handle,
            budget,
            armed: true,
        }
    }

    #[must_use]
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// Delete the pod now and disarm the guard.
    pub async fn release(mut self) -> Option<CleanupWarning> {
        self.armed = false;
        release(&*self.api, &self.registry, &self.handle, self.budget).await
    }
}

impl<A> Drop for CleanupGuard<A>
where
    A: WorkloadApi + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(pod = %self.handle, "no runtime left to delete pod");
            return;
        };
        let api = Arc::clone(&self.api);
        let registry = Arc::clone(&self.registry);
        let handle = self.handle.clone();
        let budget = self.budget;
        runtime.spawn(async move {
            if let Some(warning) = release(&*api, &registry, &handle, budget).await {
                warn!("{warning}");
            }
        });
    }
}
