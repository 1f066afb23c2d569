//! Classification predicates and the ordered predicate→column tables.
//!
//! Every predicate is a total function over a single item: a missing
//! condition or taint evaluates to `false`, never to an error. The output
//! schema is derived from the tables below, so adding a predicate here
//! adds its column to every emitted row.

use crate::models::{ConditionStatus, Machine, NodeClaim, ResourceItem};

/// Node condition reporting kubelet readiness.
pub const NODE_READY_CONDITION: &str = "Ready";

/// Node condition set by the health probe; `False` marks the node unhealthy.
pub const NODE_HEALTH_CONDITION: &str = "TestTypeReady";

/// Taint applied to nodes selected for disruption.
pub const DISRUPTED_TAINT_KEY: &str = "karpenter.sh/disrupted";

pub const CONDITION_LAUNCHED: &str = "Launched";
pub const CONDITION_REGISTERED: &str = "Registered";
pub const CONDITION_INITIALIZED: &str = "Initialized";
pub const CONDITION_DRIFTED: &str = "Drifted";
pub const CONDITION_DISRUPTION_REASON: &str = "DisruptionReason";

/// A predicate over one item.
pub type Predicate<T> = fn(&T) -> bool;

/// Ordered mapping from output column name to predicate.
pub type PredicateTable<T> = &'static [(&'static str, Predicate<T>)];

/// Column predicates for machines, in output order.
pub const NODE_PREDICATES: PredicateTable<Machine> = &[
    ("node_ready", is_ready),
    ("node_unhealthy", is_unhealthy),
    ("node_tainted", is_disruption_tainted),
    ("node_deleting", is_deleting::<Machine>),
];

/// Column predicates for nodeclaims, in output order.
pub const NODECLAIM_PREDICATES: PredicateTable<NodeClaim> = &[
    ("nodeclaim_launched", is_launched),
    ("nodeclaim_registered", is_registered),
    ("nodeclaim_initialized", is_initialized),
    ("nodeclaim_drifted", is_drifted),
    ("nodeclaim_disrupted", is_disrupted),
    ("nodeclaim_deleting", is_deleting::<NodeClaim>),
];

pub const TIME_COLUMN: &str = "time";
pub const NODE_TOTAL_COLUMN: &str = "node_total";
pub const NODECLAIM_TOTAL_COLUMN: &str = "nodeclaim_total";

/// Returns the full output header: time, node totals and predicates,
/// then nodeclaim totals and predicates.
pub fn header() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(3 + NODE_PREDICATES.len() + NODECLAIM_PREDICATES.len());
    columns.push(TIME_COLUMN);
    columns.push(NODE_TOTAL_COLUMN);
    columns.extend(NODE_PREDICATES.iter().map(|(name, _)| *name));
    columns.push(NODECLAIM_TOTAL_COLUMN);
    columns.extend(NODECLAIM_PREDICATES.iter().map(|(name, _)| *name));
    columns
}

/// True when the named condition is present with the given status.
pub fn has_condition<T: ResourceItem>(item: &T, kind: &str, status: ConditionStatus) -> bool {
    item.condition(kind).is_some_and(|c| c.status == status)
}

/// True when the named condition is present and `True`.
pub fn has_condition_true<T: ResourceItem>(item: &T, kind: &str) -> bool {
    has_condition(item, kind, ConditionStatus::True)
}

/// True once the item carries a deletion timestamp.
pub fn is_deleting<T: ResourceItem>(item: &T) -> bool {
    item.metadata().deletion_timestamp.is_some()
}

pub fn is_ready(node: &Machine) -> bool {
    has_condition_true(node, NODE_READY_CONDITION)
}

/// Unhealthy means the health condition is explicitly `False`; a missing
/// or `Unknown` condition does not count.
pub fn is_unhealthy(node: &Machine) -> bool {
    has_condition(node, NODE_HEALTH_CONDITION, ConditionStatus::False)
}

pub fn is_tainted(node: &Machine, key: &str) -> bool {
    node.spec.taints.iter().any(|t| t.key == key)
}

fn is_disruption_tainted(node: &Machine) -> bool {
    is_tainted(node, DISRUPTED_TAINT_KEY)
}

fn is_launched(claim: &NodeClaim) -> bool {
    has_condition_true(claim, CONDITION_LAUNCHED)
}

fn is_registered(claim: &NodeClaim) -> bool {
    has_condition_true(claim, CONDITION_REGISTERED)
}

fn is_initialized(claim: &NodeClaim) -> bool {
    has_condition_true(claim, CONDITION_INITIALIZED)
}

fn is_drifted(claim: &NodeClaim) -> bool {
    has_condition_true(claim, CONDITION_DRIFTED)
}

fn is_disrupted(claim: &NodeClaim) -> bool {
    has_condition_true(claim, CONDITION_DISRUPTION_REASON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ObjectMeta, Taint};
    use chrono::Utc;

    fn node_with(conditions: &[(&str, ConditionStatus)]) -> Machine {
        let mut node = Machine::default();
        node.status.conditions = conditions
            .iter()
            .map(|(kind, status)| Condition {
                kind: kind.to_string(),
                status: *status,
            })
            .collect();
        node
    }

    #[test]
    fn test_header_matches_output_schema() {
        assert_eq!(
            header().join(","),
            "time,node_total,node_ready,node_unhealthy,node_tainted,node_deleting,\
nodeclaim_total,nodeclaim_launched,nodeclaim_registered,nodeclaim_initialized,\
nodeclaim_drifted,nodeclaim_disrupted,nodeclaim_deleting"
        );
    }

    #[test]
    fn test_missing_conditions_are_false() {
        let node = Machine::default();
        assert!(!is_ready(&node));
        assert!(!is_unhealthy(&node));
        assert!(!is_tainted(&node, DISRUPTED_TAINT_KEY));
        assert!(!is_deleting(&node));

        let claim = NodeClaim::default();
        for (_, predicate) in NODECLAIM_PREDICATES {
            assert!(!predicate(&claim));
        }
    }

    #[test]
    fn test_ready_requires_true_status() {
        assert!(is_ready(&node_with(&[("Ready", ConditionStatus::True)])));
        assert!(!is_ready(&node_with(&[("Ready", ConditionStatus::False)])));
        assert!(!is_ready(&node_with(&[("Ready", ConditionStatus::Unknown)])));
    }

    #[test]
    fn test_unhealthy_requires_explicit_false() {
        assert!(is_unhealthy(&node_with(&[(
            NODE_HEALTH_CONDITION,
            ConditionStatus::False
        )])));
        assert!(!is_unhealthy(&node_with(&[(
            NODE_HEALTH_CONDITION,
            ConditionStatus::Unknown
        )])));
        // A not-ready node is not unhealthy by itself.
        assert!(!is_unhealthy(&node_with(&[("Ready", ConditionStatus::False)])));
    }

    #[test]
    fn test_tainted_matches_key_only() {
        let mut node = Machine::default();
        node.spec.taints.push(Taint {
            key: DISRUPTED_TAINT_KEY.to_string(),
            value: Some("anything".to_string()),
            effect: "NoSchedule".to_string(),
        });
        assert!(is_tainted(&node, DISRUPTED_TAINT_KEY));
        assert!(!is_tainted(&node, "node.kubernetes.io/unreachable"));
    }

    #[test]
    fn test_deleting_claim() {
        let claim = NodeClaim {
            metadata: ObjectMeta {
                name: "nc".to_string(),
                deletion_timestamp: Some(Utc::now()),
            },
            ..Default::default()
        };
        assert!(is_deleting(&claim));
    }

    #[test]
    fn test_claim_conditions() {
        let mut claim = NodeClaim::default();
        claim.status.conditions = vec![
            Condition {
                kind: CONDITION_LAUNCHED.to_string(),
                status: ConditionStatus::True,
            },
            Condition {
                kind: CONDITION_REGISTERED.to_string(),
                status: ConditionStatus::False,
            },
        ];
        assert!(is_launched(&claim));
        assert!(!is_registered(&claim));
        assert!(!is_initialized(&claim));
    }
}
