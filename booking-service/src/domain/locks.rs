use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

type ProviderLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
struct WorkspaceLock {
    gate: Arc<RwLock<()>>,
    providers: HashMap<Uuid, ProviderLock>,
}

impl WorkspaceLock {
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.gate) == 1
            && self.providers.values().all(|p| Arc::strong_count(p) == 1)
    }
}

/// Serializes check-then-insert per workspace and provider within this process.
///
/// Provider-scoped requests share the workspace read lock and hold their provider's
/// mutex; workspace-wide requests take the workspace write lock.
#[derive(Default)]
pub struct BookingLocks {
    workspaces: Mutex<HashMap<Uuid, WorkspaceLock>>,
}

/// Held for the duration of a booking decision and insert.
pub enum BookingGuard {
    Workspace(OwnedRwLockWriteGuard<()>),
    Provider {
        _workspace: OwnedRwLockReadGuard<()>,
        _provider: OwnedMutexGuard<()>,
    },
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, workspace_id: Uuid, provider_id: Option<Uuid>) -> BookingGuard {
        let (gate, provider) = {
            let mut workspaces = self
                .workspaces
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let entry = workspaces.entry(workspace_id).or_default();
            let provider = provider_id.map(|id| Arc::clone(entry.providers.entry(id).or_default()));
            (Arc::clone(&entry.gate), provider)
        };

        match provider {
            None => BookingGuard::Workspace(gate.write_owned().await),
            Some(provider) => {
                let workspace = gate.read_owned().await;
                BookingGuard::Provider {
                    _workspace: workspace,
                    _provider: provider.lock_owned().await,
                }
            }
        }
    }

    /// Drops lock entries nobody holds or waits on.
    pub fn prune(&self) {
        let mut workspaces = self
            .workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        workspaces.retain(|_, ws| {
            ws.providers.retain(|_, p| Arc::strong_count(p) > 1);
            !ws.is_idle()
        });
    }

    pub fn tracked_workspaces(&self) -> usize {
        self.workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
