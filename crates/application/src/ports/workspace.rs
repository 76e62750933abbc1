//! Workspace source port
//!
//! Monitors read collections, environments and globals at firing time, so
//! edits made between firings are picked up.

use async_trait::async_trait;
use probe_domain::collection::Collection;
use probe_domain::environment::{Environment, GlobalVars};
use tokio::sync::RwLock;

use crate::ApplicationResult;

/// Read-only copy of the workspace data a run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    /// All collections.
    pub collections: Vec<Collection>,
    /// All environments.
    pub environments: Vec<Environment>,
    /// Workspace globals.
    pub globals: GlobalVars,
}

impl WorkspaceSnapshot {
    /// Finds a collection by id.
    #[must_use]
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }
}

/// Port for reading the current workspace.
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    /// Returns a snapshot of the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be loaded.
    async fn snapshot(&self) -> ApplicationResult<WorkspaceSnapshot>;
}

/// Workspace held in memory; replaced wholesale by [`InMemoryWorkspace::replace`].
#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    snapshot: RwLock<WorkspaceSnapshot>,
}

impl InMemoryWorkspace {
    /// Creates a workspace from an initial snapshot.
    #[must_use]
    pub fn new(snapshot: WorkspaceSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Replaces the held snapshot.
    pub async fn replace(&self, snapshot: WorkspaceSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

#[async_trait]
impl WorkspaceSource for InMemoryWorkspace {
    async fn snapshot(&self) -> ApplicationResult<WorkspaceSnapshot> {
        Ok(self.snapshot.read().await.clone())
    }
}
