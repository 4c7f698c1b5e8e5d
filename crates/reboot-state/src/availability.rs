//! Cluster availability accounting.
//!
//! A node counts as unavailable when it is approved for reboot, mid-reboot, or
//! reporting a `Ready=False` condition. The count is a pure function of a cache
//! snapshot: the controller recomputes it with a full scan on every event
//! rather than maintaining an incremental counter, trading CPU for
//! correctness-by-recomputation.

use k8s_openapi::api::core::v1::Node;

use crate::state::RebootState;

/// Whether the node's health subsystem reports `Ready=False`.
///
/// `Unknown` is deliberately not counted, matching the readiness semantics of
/// the node controller: only a definitive not-ready report makes the node
/// unavailable for capacity purposes.
#[must_use]
pub fn ready_condition_is_false(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "False")
        })
}

/// Whether the node counts against the `max_unavailable` budget.
///
/// Approved-but-not-yet-rebooting nodes count too: the budget must be reserved
/// from the moment of approval, or two approvals racing the agent could both
/// land inside it.
#[must_use]
pub fn is_unavailable(node: &Node) -> bool {
    matches!(
        RebootState::of(node),
        RebootState::Approved | RebootState::InProgress
    ) || ready_condition_is_false(node)
}

/// Counts unavailable nodes across a cache snapshot.
#[must_use]
pub fn count_unavailable<'a, I>(nodes: I) -> usize
where
    I: IntoIterator<Item = &'a Node>,
{
    nodes.into_iter().filter(|n| is_unavailable(n)).count()
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{NodeCondition, NodeStatus};

    use super::*;
    use crate::state::{APPROVED_ANNOTATION, IN_PROGRESS_ANNOTATION, NEEDED_ANNOTATION};

    fn node(name: &str) -> Node {
        let mut node = Node::default();
        node.metadata.name = Some(name.to_string());
        node
    }

    fn annotated(name: &str, key: &str) -> Node {
        let mut node = node(name);
        node.metadata.annotations = Some([(key.to_string(), String::new())].into());
        node
    }

    fn with_ready_condition(name: &str, status: &str) -> Node {
        let mut node = node(name);
        node.status = Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: status.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        });
        node
    }

    #[test]
    fn healthy_idle_node_is_available() {
        assert!(!is_unavailable(&with_ready_condition("worker-0", "True")));
        assert!(!is_unavailable(&node("worker-1")));
    }

    #[test]
    fn requested_node_is_still_available() {
        // A pending request holds no capacity until the controller approves it.
        assert!(!is_unavailable(&annotated("worker-0", NEEDED_ANNOTATION)));
    }

    #[test]
    fn approved_and_in_progress_nodes_are_unavailable() {
        assert!(is_unavailable(&annotated("worker-0", APPROVED_ANNOTATION)));
        assert!(is_unavailable(&annotated("worker-1", IN_PROGRESS_ANNOTATION)));
    }

    #[test]
    fn not_ready_counts_but_unknown_does_not() {
        assert!(is_unavailable(&with_ready_condition("worker-0", "False")));
        assert!(!is_unavailable(&with_ready_condition("worker-1", "Unknown")));
    }

    #[test]
    fn count_is_independent_of_snapshot_order() {
        let nodes = vec![
            annotated("worker-0", APPROVED_ANNOTATION),
            with_ready_condition("worker-1", "False"),
            annotated("worker-2", NEEDED_ANNOTATION),
            with_ready_condition("worker-3", "True"),
            annotated("worker-4", IN_PROGRESS_ANNOTATION),
        ];
        assert_eq!(count_unavailable(&nodes), 3);

        let reversed: Vec<Node> = nodes.into_iter().rev().collect();
        assert_eq!(count_unavailable(&reversed), 3);
    }

    #[test]
    fn empty_snapshot_counts_zero() {
        let nodes: Vec<Node> = Vec::new();
        assert_eq!(count_unavailable(&nodes), 0);
    }
}
