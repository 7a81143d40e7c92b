//! Per-project mutual exclusion.
//!
//! Every multi-step transition (status check, mutation, dependent ledger
//! mutation) runs while holding the owning project's lock. Two callers
//! racing on the same project serialize; callers on different projects
//! never contend.

use escrow_types::ProjectId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Registry of one async mutex per project.
///
/// Entries are tiny and created on first use; they live for the process,
/// which bounds the registry by the number of projects ever touched.
#[derive(Default)]
pub(crate) struct ProjectLocks {
    inner: Mutex<HashMap<ProjectId, Arc<AsyncMutex<()>>>>,
}

impl ProjectLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `project_id`, created if absent.
    ///
    /// The returned handle must be `.lock().await`-ed by the caller; the
    /// registry's own mutex is released before any awaiting happens.
    pub(crate) fn lock_for(&self, project_id: ProjectId) -> Arc<AsyncMutex<()>> {
        self.inner
            .lock()
            .entry(project_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
