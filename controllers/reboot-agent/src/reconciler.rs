//! The agent's per-node state machine.
//!
//! Only update deliveries matter: the initial add is ignored (as in the
//! controller-demo lineage of this design), and a node that comes back up
//! with `reboot-in-progress` still set is handled on the first resync
//! re-delivery after startup.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use node_client::NodeClientTrait;
use node_informer::EventHandler;
use reboot_state::{RebootState, begin_reboot, finish_reboot};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::error::AgentError;
use crate::reboot::Rebooter;

/// Executes approved reboots for one node.
pub struct Reconciler<C, R> {
    client: C,
    rebooter: R,
    node_name: String,
    /// Signals the run loop to exit: `Ok` after the reboot primitive fires,
    /// `Err` if it fails.
    halt: UnboundedSender<Result<(), AgentError>>,
    /// Set once the reboot primitive has been invoked. The process is about
    /// to exit; any further deliveries (such as the echo of our own
    /// in-progress write) must not be acted on.
    halted: bool,
}

impl<C: NodeClientTrait, R: Rebooter> Reconciler<C, R> {
    /// Creates a new reconciler instance.
    pub fn new(
        client: C,
        rebooter: R,
        node_name: String,
        halt: UnboundedSender<Result<(), AgentError>>,
    ) -> Self {
        Self {
            client,
            rebooter,
            node_name,
            halt,
            halted: false,
        }
    }

    /// Handles one delivery of this agent's node.
    pub(crate) async fn handle(&mut self, node: &Node) {
        if self.halted {
            return;
        }

        let mut copy = node.clone();
        match RebootState::of(&copy) {
            RebootState::Approved => {
                info!(
                    "reboot approved for {}, recording in-progress state",
                    self.node_name
                );
                begin_reboot(&mut copy);
                if let Err(e) = self.client.update_node(&copy).await {
                    // Never reboot without first durably recording intent.
                    error!("failed to record reboot intent, not rebooting: {e}");
                    return;
                }

                info!("rebooting node {}", self.node_name);
                self.halted = true;
                match self.rebooter.reboot_now().await {
                    Ok(()) => {
                        // Terminal: the host restart takes it from here.
                        let _ = self.halt.send(Ok(()));
                    }
                    Err(e) => {
                        error!("host reboot primitive failed: {e}");
                        let _ = self.halt.send(Err(e));
                    }
                }
            }
            RebootState::InProgress => {
                // The marker survived a restart, so the reboot is taken as
                // complete. This conflates "reboot finished" with "agent
                // restarted for any reason"; comparing boot identifiers
                // before and after would disambiguate.
                info!(
                    "clearing in-progress reboot marker on {}",
                    self.node_name
                );
                finish_reboot(&mut copy);
                if let Err(e) = self.client.update_node(&copy).await {
                    warn!("failed to clear in-progress marker, will retry on resync: {e}");
                }
            }
            state => debug!("node {} is {state}, nothing to do", self.node_name),
        }
    }
}

#[async_trait]
impl<C: NodeClientTrait, R: Rebooter> EventHandler<Node> for Reconciler<C, R> {
    async fn on_add(&mut self, new: &Node) {
        // The initial listing is not acted on; pending state is picked up by
        // the first resync re-delivery.
        debug!(
            "node {} listed",
            new.metadata.name.as_deref().unwrap_or_default()
        );
    }

    async fn on_update(&mut self, _old: &Node, new: &Node) {
        self.handle(new).await;
    }

    async fn on_delete(&mut self, old: &Node) {
        warn!(
            "own node {} was deleted from the cluster",
            old.metadata.name.as_deref().unwrap_or_default()
        );
    }
}
