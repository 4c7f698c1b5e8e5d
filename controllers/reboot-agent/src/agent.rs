//! Agent wiring and run loop.

use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use kube::Client;
use node_client::{KubeNodes, NodeClientError};
use node_informer::{Informer, Store};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::AgentError;
use crate::reboot::CommandRebooter;
use crate::reconciler::Reconciler;

/// The per-node reboot agent.
pub struct Agent {
    node_watcher: JoinHandle<Result<(), NodeClientError>>,
    halt: UnboundedReceiver<Result<(), AgentError>>,
}

impl Agent {
    /// Creates a new agent instance watching only `node_name`.
    pub async fn new(
        node_name: String,
        resync_period: Duration,
        reboot_command: &str,
    ) -> Result<Self, AgentError> {
        info!("Initializing Reboot Agent for node {node_name}");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;
        let nodes = KubeNodes::for_node(kube_client, &node_name);
        let rebooter = CommandRebooter::new(reboot_command)?;

        let (halt_tx, halt_rx) = mpsc::unbounded_channel();
        let store: Store<Node> = Store::new();
        let reconciler = Reconciler::new(nodes.clone(), rebooter, node_name, halt_tx);
        let informer = Informer::new(nodes, store, reconciler, resync_period);

        Ok(Self {
            node_watcher: tokio::spawn(informer.run()),
            halt: halt_rx,
        })
    }

    /// Runs the agent until it halts for a reboot or the watcher dies.
    pub async fn run(mut self) -> Result<(), AgentError> {
        info!("Reboot Agent running");

        tokio::select! {
            halt = self.halt.recv() => match halt {
                Some(Ok(())) => {
                    info!("reboot under way, exiting until the host restarts");
                    Ok(())
                }
                Some(Err(e)) => Err(e),
                None => Err(AgentError::Watch("halt channel closed".to_string())),
            },
            result = &mut self.node_watcher => {
                result
                    .map_err(|e| AgentError::Watch(format!("node watcher panicked: {e}")))?
                    .map_err(AgentError::Client)
            }
        }
    }
}
