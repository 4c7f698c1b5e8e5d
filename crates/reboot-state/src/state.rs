//! The annotation-encoded reboot state machine.
//!
//! Lifecycle per node: `Idle -> Requested -> Approved -> InProgress -> Idle`.
//! An external actor sets the `reboot-needed` annotation, the controller
//! promotes it to `reboot` (approved) when cluster capacity allows, and the
//! agent on the node replaces both markers with `reboot-in-progress` before
//! actually rebooting.
//!
//! Classification collapses the raw key combinations into a single enum so the
//! rest of the system never reasons about individual keys. The transition
//! writers uphold the invariant that `reboot` and `reboot-in-progress` are
//! never both present after a write.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::Node;

/// Set by an external actor to request a reboot. Cleared by the agent when the
/// reboot begins.
pub const NEEDED_ANNOTATION: &str = "reboot.node.io/reboot-needed";

/// Set by the controller once capacity allows. Cleared by the agent when the
/// reboot begins.
pub const APPROVED_ANNOTATION: &str = "reboot.node.io/reboot";

/// Set by the agent immediately before rebooting, cleared by the agent once it
/// observes the node running again.
pub const IN_PROGRESS_ANNOTATION: &str = "reboot.node.io/reboot-in-progress";

/// Where a node is in its reboot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootState {
    /// No reboot requested or underway.
    Idle,
    /// An external actor asked for a reboot; the controller has not yet
    /// approved it.
    Requested,
    /// The controller granted capacity; the agent has not started yet.
    Approved,
    /// The agent recorded its intent and is rebooting (or the node just came
    /// back up with the marker still set).
    InProgress,
}

impl RebootState {
    /// Classifies a node from its annotations.
    ///
    /// Precedence runs backwards through the lifecycle (`InProgress` over
    /// `Approved` over `Requested`) so a stale or partially-written key
    /// combination still maps onto the furthest state the node provably
    /// reached.
    #[must_use]
    pub fn of(node: &Node) -> Self {
        let Some(annotations) = node.metadata.annotations.as_ref() else {
            return Self::Idle;
        };
        if annotations.contains_key(IN_PROGRESS_ANNOTATION) {
            Self::InProgress
        } else if annotations.contains_key(APPROVED_ANNOTATION) {
            Self::Approved
        } else if annotations.contains_key(NEEDED_ANNOTATION) {
            Self::Requested
        } else {
            Self::Idle
        }
    }
}

impl fmt::Display for RebootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::InProgress => "in-progress",
        };
        f.write_str(s)
    }
}

fn annotations_mut(node: &mut Node) -> &mut BTreeMap<String, String> {
    node.metadata.annotations.get_or_insert_with(BTreeMap::new)
}

/// Marks a node approved for reboot.
///
/// The `reboot-needed` marker stays set; only the agent clears it, in the same
/// write that records in-progress.
pub fn approve(node: &mut Node) {
    annotations_mut(node).insert(APPROVED_ANNOTATION.to_string(), String::new());
}

/// Records that the agent is about to reboot the node.
///
/// Sets `reboot-in-progress` and clears `reboot-needed` and `reboot` in one
/// mutation, so a single update call persists the whole transition.
pub fn begin_reboot(node: &mut Node) {
    let annotations = annotations_mut(node);
    annotations.insert(IN_PROGRESS_ANNOTATION.to_string(), String::new());
    annotations.remove(NEEDED_ANNOTATION);
    annotations.remove(APPROVED_ANNOTATION);
}

/// Clears the in-progress marker after the node is observed running again.
pub fn finish_reboot(node: &mut Node) {
    annotations_mut(node).remove(IN_PROGRESS_ANNOTATION);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_annotations(keys: &[&str]) -> Node {
        let mut node = Node::default();
        node.metadata.name = Some("worker-0".to_string());
        if !keys.is_empty() {
            node.metadata.annotations = Some(
                keys.iter()
                    .map(|k| ((*k).to_string(), String::new()))
                    .collect(),
            );
        }
        node
    }

    fn annotation_keys(node: &Node) -> Vec<&str> {
        node.metadata
            .annotations
            .as_ref()
            .map(|a| a.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn classifies_absent_annotations_as_idle() {
        assert_eq!(RebootState::of(&node_with_annotations(&[])), RebootState::Idle);
    }

    #[test]
    fn classifies_each_lifecycle_stage() {
        assert_eq!(
            RebootState::of(&node_with_annotations(&[NEEDED_ANNOTATION])),
            RebootState::Requested
        );
        assert_eq!(
            RebootState::of(&node_with_annotations(&[NEEDED_ANNOTATION, APPROVED_ANNOTATION])),
            RebootState::Approved
        );
        assert_eq!(
            RebootState::of(&node_with_annotations(&[IN_PROGRESS_ANNOTATION])),
            RebootState::InProgress
        );
    }

    #[test]
    fn in_progress_takes_precedence_over_stale_markers() {
        let node = node_with_annotations(&[
            NEEDED_ANNOTATION,
            APPROVED_ANNOTATION,
            IN_PROGRESS_ANNOTATION,
        ]);
        assert_eq!(RebootState::of(&node), RebootState::InProgress);
    }

    #[test]
    fn approve_keeps_needed_marker() {
        let mut node = node_with_annotations(&[NEEDED_ANNOTATION]);
        approve(&mut node);
        assert_eq!(
            annotation_keys(&node),
            vec![APPROVED_ANNOTATION, NEEDED_ANNOTATION]
        );
        assert_eq!(RebootState::of(&node), RebootState::Approved);
    }

    #[test]
    fn begin_reboot_replaces_request_and_approval_in_one_write() {
        let mut node = node_with_annotations(&[NEEDED_ANNOTATION, APPROVED_ANNOTATION]);
        begin_reboot(&mut node);
        assert_eq!(annotation_keys(&node), vec![IN_PROGRESS_ANNOTATION]);
    }

    #[test]
    fn approved_and_in_progress_never_coexist_after_transitions() {
        // Walk the full lifecycle and check the invariant after every writer.
        let mut node = node_with_annotations(&[NEEDED_ANNOTATION]);
        for step in [approve, begin_reboot, finish_reboot] {
            step(&mut node);
            let keys = annotation_keys(&node);
            assert!(
                !(keys.contains(&APPROVED_ANNOTATION) && keys.contains(&IN_PROGRESS_ANNOTATION)),
                "approved and in-progress both present: {keys:?}"
            );
        }
        assert_eq!(RebootState::of(&node), RebootState::Idle);
    }

    #[test]
    fn finish_reboot_returns_node_to_idle() {
        let mut node = node_with_annotations(&[IN_PROGRESS_ANNOTATION]);
        finish_reboot(&mut node);
        assert_eq!(RebootState::of(&node), RebootState::Idle);
        assert!(annotation_keys(&node).is_empty());
    }

    #[test]
    fn writers_tolerate_missing_annotation_map() {
        let mut node = node_with_annotations(&[]);
        begin_reboot(&mut node);
        assert_eq!(RebootState::of(&node), RebootState::InProgress);
    }
}
