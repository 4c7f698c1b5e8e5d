//! Approval logic for pending reboot requests.
//!
//! Every node event — add, update, delete, or resync re-delivery — funnels
//! into one evaluation: does this node want a reboot, and does the cluster
//! have capacity for it right now? The capacity check is a full scan of the
//! cache snapshot on every event; recomputing from scratch keeps the count a
//! pure function of observed state instead of a counter that can drift.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use node_client::NodeClientTrait;
use node_informer::{EventHandler, Store};
use reboot_state::{RebootState, approve, count_unavailable};
use tracing::{debug, error, info};

/// Reconciles reboot requests against the unavailability budget.
pub struct Reconciler<C> {
    client: C,
    store: Store<Node>,
    max_unavailable: usize,
}

impl<C: NodeClientTrait> Reconciler<C> {
    /// Creates a new reconciler instance.
    pub fn new(client: C, store: Store<Node>, max_unavailable: usize) -> Self {
        Self {
            client,
            store,
            max_unavailable,
        }
    }

    /// Re-evaluates one node.
    ///
    /// No-ops unless the node is in the `Requested` state: idle nodes have
    /// nothing pending, and approved or in-progress nodes are already the
    /// agent's responsibility. A denial is not an error — the node stays
    /// pending and the next event or resync re-evaluates it.
    pub(crate) async fn evaluate(&self, node: &Node) {
        let name = node.metadata.name.as_deref().unwrap_or_default();
        let state = RebootState::of(node);
        debug!("node {name} is {state}");

        if state != RebootState::Requested {
            return;
        }

        let snapshot = self.store.snapshot();
        let unavailable = count_unavailable(&snapshot);
        if unavailable >= self.max_unavailable {
            info!(
                "too many nodes unavailable ({unavailable}/{}), deferring reboot of {name}",
                self.max_unavailable
            );
            return;
        }

        info!("approving reboot of node {name}");
        let mut copy = node.clone();
        approve(&mut copy);
        match self.client.update_node(&copy).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                // The stored node moved on since this copy was read. Drop the
                // write; the resulting watch event re-evaluates with fresh
                // state.
                info!("node {name} changed since read, approval dropped");
            }
            Err(e) => error!("failed to approve reboot of {name}: {e}"),
        }
    }
}

#[async_trait]
impl<C: NodeClientTrait> EventHandler<Node> for Reconciler<C> {
    async fn on_add(&mut self, new: &Node) {
        self.evaluate(new).await;
    }

    async fn on_update(&mut self, _old: &Node, new: &Node) {
        self.evaluate(new).await;
    }

    async fn on_delete(&mut self, old: &Node) {
        // Uniform treatment: a deleted node is re-evaluated like any other
        // event. If it somehow still requested a reboot, the approval write
        // fails at the store and is dropped.
        self.evaluate(old).await;
    }
}
