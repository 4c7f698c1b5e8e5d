//! Kubernetes-backed node transport.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams, PostParams, WatchEvent, WatchParams};
use kube::Client;
use node_informer::{Event, ListWatch};
use tracing::debug;

use crate::error::NodeClientError;
use crate::r#trait::NodeClientTrait;

/// HTTP status codes the API server uses for the interesting update failures.
const CONFLICT: u16 = 409;
const NOT_FOUND: u16 = 404;

/// Node store access via the Kubernetes API.
///
/// Cluster-scope by default; [`KubeNodes::for_node`] restricts both list and
/// watch to a single node with a server-side field selector, which is how the
/// agent watches only itself.
#[derive(Clone)]
pub struct KubeNodes {
    api: Api<Node>,
    field_selector: Option<String>,
}

impl KubeNodes {
    /// Watches and updates all nodes in the cluster.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
            field_selector: None,
        }
    }

    /// Watches and updates exactly one node, filtered server-side by name.
    #[must_use]
    pub fn for_node(client: Client, node_name: &str) -> Self {
        Self {
            api: Api::all(client),
            field_selector: Some(format!("metadata.name={node_name}")),
        }
    }
}

#[async_trait]
impl ListWatch<Node> for KubeNodes {
    type Error = NodeClientError;

    async fn list(&self) -> Result<(Vec<Node>, String), NodeClientError> {
        let mut params = ListParams::default();
        if let Some(fields) = &self.field_selector {
            params = params.fields(fields);
        }
        let nodes = self.api.list(&params).await?;
        let checkpoint = nodes.metadata.resource_version.unwrap_or_default();
        debug!(
            "listed {} nodes at resource version {checkpoint}",
            nodes.items.len()
        );
        Ok((nodes.items, checkpoint))
    }

    async fn watch(
        &self,
        checkpoint: &str,
    ) -> Result<BoxStream<'static, Result<Event<Node>, NodeClientError>>, NodeClientError> {
        let mut params = WatchParams::default();
        if let Some(fields) = &self.field_selector {
            params = params.fields(fields);
        }
        let stream = self.api.watch(&params, checkpoint).await?;
        Ok(stream
            .filter_map(|event| async move {
                match event {
                    Ok(WatchEvent::Added(node)) => Some(Ok(Event::Added(node))),
                    Ok(WatchEvent::Modified(node)) => Some(Ok(Event::Modified(node))),
                    Ok(WatchEvent::Deleted(node)) => Some(Ok(Event::Deleted(node))),
                    // Only a checkpoint carrier; the informer relists anyway.
                    Ok(WatchEvent::Bookmark(_)) => None,
                    Ok(WatchEvent::Error(status)) => {
                        Some(Err(NodeClientError::Transport(status.message)))
                    }
                    Err(e) => Some(Err(NodeClientError::Kube(e))),
                }
            })
            .boxed())
    }
}

#[async_trait]
impl NodeClientTrait for KubeNodes {
    async fn update_node(&self, node: &Node) -> Result<Node, NodeClientError> {
        let name = node
            .metadata
            .name
            .as_deref()
            .ok_or(NodeClientError::MissingName)?;
        match self.api.replace(name, &PostParams::default(), node).await {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(response)) if response.code == CONFLICT => {
                Err(NodeClientError::Conflict)
            }
            Err(kube::Error::Api(response)) if response.code == NOT_FOUND => {
                Err(NodeClientError::NotFound(name.to_string()))
            }
            Err(e) => Err(NodeClientError::Kube(e)),
        }
    }
}
