//! Main controller implementation.
//!
//! Wires the node informer to the approval reconciler and runs it until
//! shutdown. The controller watches all nodes (no filtering): the approval
//! decision needs the whole cluster in view to count unavailable nodes.

use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use kube::Client;
use node_client::{KubeNodes, NodeClientError};
use node_informer::{Informer, Store};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::ControllerError;
use crate::reconciler::Reconciler;

/// Main controller for reboot approval.
pub struct Controller {
    node_watcher: JoinHandle<Result<(), NodeClientError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        max_unavailable: usize,
        resync_period: Duration,
    ) -> Result<Self, ControllerError> {
        info!("Initializing Reboot Controller");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;
        let nodes = KubeNodes::new(kube_client);

        // The reconciler counts unavailability over the informer's cache, so
        // both share one store.
        let store: Store<Node> = Store::new();
        let reconciler = Reconciler::new(nodes.clone(), store.clone(), max_unavailable);
        let informer = Informer::new(nodes, store, reconciler, resync_period);

        let node_watcher = tokio::spawn(informer.run());

        Ok(Self { node_watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Reboot Controller running");

        let result = (&mut self.node_watcher).await;
        result
            .map_err(|e| ControllerError::Watch(format!("node watcher panicked: {e}")))?
            .map_err(ControllerError::Client)
    }
}
