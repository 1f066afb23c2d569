//! Directory-backed resource store.
//!
//! Reads list dumps in the cluster API JSON shape (as produced by
//! `kubectl get nodes -o json` and `kubectl get nodeclaims -o json`) from a
//! source directory. Files are re-read on every call, so an external
//! process refreshing them acts as the read-through cache.

use super::{ResourceKind, ResourceStore, StoreError};
use crate::models::{ItemList, Machine, NodeClaim};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name holding the machine list.
pub const MACHINES_FILE: &str = "nodes.json";

/// File name holding the nodeclaim list.
pub const NODE_CLAIMS_FILE: &str = "nodeclaims.json";

/// Resource store reading JSON list dumps from a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, kind: ResourceKind) -> PathBuf {
        match kind {
            ResourceKind::Machine => self.root.join(MACHINES_FILE),
            ResourceKind::NodeClaim => self.root.join(NODE_CLAIMS_FILE),
        }
    }

    fn read_list<T: DeserializeOwned>(&self, kind: ResourceKind) -> Result<Vec<T>, StoreError> {
        let path = self.path_for(kind);

        if !path.exists() {
            return Err(StoreError::Unavailable {
                kind,
                reason: format!("{} does not exist yet", path.display()),
            });
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        // A writer may have truncated the file just before refilling it.
        if content.trim().is_empty() {
            return Err(StoreError::Unavailable {
                kind,
                reason: format!("{} is empty", path.display()),
            });
        }

        let list: ItemList<T> =
            serde_json::from_str(&content).map_err(|source| StoreError::Decode { path, source })?;

        debug!("Listed {} {}", list.items.len(), kind);
        Ok(list.items)
    }
}

impl ResourceStore for FileStore {
    fn list_machines(&self) -> Result<Vec<Machine>, StoreError> {
        self.read_list(ResourceKind::Machine)
    }

    fn list_node_claims(&self) -> Result<Vec<NodeClaim>, StoreError> {
        self.read_list(ResourceKind::NodeClaim)
    }
}
