//! Resource-store boundary.
//!
//! The sampler only needs a synchronous "list everything of this kind"
//! read against a recent view of the cluster. Any error returned here is
//! treated as transient by the sampling loop.

pub mod file_store;

pub use file_store::FileStore;

use crate::models::{Machine, NodeClaim};
use std::fmt;
use std::path::PathBuf;

/// Kinds of resources the store can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Machine,
    NodeClaim,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Machine => write!(f, "nodes"),
            ResourceKind::NodeClaim => write!(f, "nodeclaims"),
        }
    }
}

/// Errors from listing resources. All of them are retryable.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has no consistent view yet (e.g. still syncing).
    #[error("{kind} not available: {reason}")]
    Unavailable { kind: ResourceKind, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A read-only view of cluster resources.
pub trait ResourceStore: Send + Sync {
    /// List every machine in the current view.
    fn list_machines(&self) -> Result<Vec<Machine>, StoreError>;

    /// List every nodeclaim in the current view.
    fn list_node_claims(&self) -> Result<Vec<NodeClaim>, StoreError>;
}
