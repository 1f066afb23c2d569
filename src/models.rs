//! Data models for the sampler.
//!
//! This module contains the resource items read from the cluster view
//! (machines and nodeclaims) and the per-cycle `Snapshot` produced from them.
//! The item types follow the cluster API JSON shape so list dumps can be
//! deserialized directly.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Tri-state status of a condition, as reported by the cluster API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A named status condition attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition name (e.g. `Ready`, `Launched`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Current status of the condition.
    pub status: ConditionStatus,
}

/// Object metadata shared by every resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name.
    #[serde(default)]
    pub name: String,
    /// Set once the object is scheduled for removal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

/// A key/value taint on a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub effect: String,
}

/// Status block holding an item's conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Machine spec. Only taints are relevant to sampling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    #[serde(default)]
    pub taints: Vec<Taint>,
}

/// A cluster compute machine (a node).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MachineSpec,
    #[serde(default)]
    pub status: ItemStatus,
}

/// A machine provisioning request (a nodeclaim).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeClaim {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: ItemStatus,
}

/// Common accessors used by the predicates.
pub trait ResourceItem {
    /// Returns the object metadata.
    fn metadata(&self) -> &ObjectMeta;

    /// Returns the item's status conditions.
    fn conditions(&self) -> &[Condition];

    /// Looks up a condition by name.
    fn condition(&self, kind: &str) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.kind == kind)
    }
}

impl ResourceItem for Machine {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn conditions(&self) -> &[Condition] {
        &self.status.conditions
    }
}

impl ResourceItem for NodeClaim {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn conditions(&self) -> &[Condition] {
        &self.status.conditions
    }
}

/// A list response in the cluster API shape (`{"items": [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One cycle's fully aggregated metrics record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Wall-clock time the cycle's aggregation finished.
    pub taken_at: DateTime<Local>,
    /// Column name to count, in output order (excludes `time`).
    pub values: Vec<(&'static str, u64)>,
}

impl Snapshot {
    /// Returns the count for a column, if present.
    pub fn get(&self, column: &str) -> Option<u64> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_from_cluster_json() {
        let json = r#"{
            "metadata": {"name": "node-a", "deletionTimestamp": "2024-05-01T10:00:00Z", "uid": "x"},
            "spec": {"taints": [{"key": "karpenter.sh/disrupted", "effect": "NoSchedule"}]},
            "status": {"conditions": [{"type": "Ready", "status": "True", "reason": "KubeletReady"}]}
        }"#;

        let machine: Machine = serde_json::from_str(json).unwrap();
        assert_eq!(machine.metadata.name, "node-a");
        assert!(machine.metadata.deletion_timestamp.is_some());
        assert_eq!(machine.spec.taints[0].key, "karpenter.sh/disrupted");
        assert_eq!(
            machine.condition("Ready").map(|c| c.status),
            Some(ConditionStatus::True)
        );
        assert!(machine.condition("MemoryPressure").is_none());
    }

    #[test]
    fn test_sparse_nodeclaim_uses_defaults() {
        let claim: NodeClaim = serde_json::from_str(r#"{"metadata": {"name": "nc-1"}}"#).unwrap();
        assert!(claim.conditions().is_empty());
        assert!(claim.metadata.deletion_timestamp.is_none());
    }

    #[test]
    fn test_item_list() {
        let list: ItemList<NodeClaim> =
            serde_json::from_str(r#"{"apiVersion": "v1", "items": [{}, {}]}"#).unwrap();
        assert_eq!(list.items.len(), 2);

        let empty: ItemList<NodeClaim> = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = Snapshot {
            taken_at: Local::now(),
            values: vec![("node_total", 3), ("node_ready", 1)],
        };
        assert_eq!(snapshot.get("node_ready"), Some(1));
        assert_eq!(snapshot.get("missing"), None);
    }
}
