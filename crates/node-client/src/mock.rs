//! In-memory node store for tests.
//!
//! Behaves like the real store where it matters to the coordination protocol:
//! a monotonic revision doubles as the resource version, stale writes are
//! rejected with a conflict, and every accepted change is broadcast to live
//! watch streams (honoring per-watcher name filters). Extra knobs let tests
//! inject a transport failure or drop every watch stream to force a relist.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Node;
use node_informer::{Event, ListWatch};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::error::NodeClientError;
use crate::r#trait::NodeClientTrait;

struct MockWatcher {
    filter: Option<String>,
    tx: UnboundedSender<Result<Event<Node>, NodeClientError>>,
}

#[derive(Default)]
struct MockState {
    nodes: BTreeMap<String, Node>,
    revision: u64,
    watchers: Vec<MockWatcher>,
    fail_next_update: bool,
}

impl MockState {
    fn broadcast(&mut self, name: &str, event: &Event<Node>) {
        self.watchers.retain(|watcher| {
            if watcher
                .filter
                .as_deref()
                .is_some_and(|filter| filter != name)
            {
                return true;
            }
            // A failed send means the stream was dropped; forget the watcher.
            watcher.tx.send(Ok(event.clone())).is_ok()
        });
    }

    fn stamp(&mut self, node: &mut Node) {
        self.revision += 1;
        node.metadata.resource_version = Some(self.revision.to_string());
    }
}

/// In-memory [`NodeClientTrait`] implementation.
///
/// Clones share state; [`MockNodes::scoped_to`] produces a handle with the
/// same server-side name filter the agent uses in production.
#[derive(Clone, Default)]
pub struct MockNodes {
    state: Arc<Mutex<MockState>>,
    filter: Option<String>,
}

impl MockNodes {
    /// An empty store with no filter (the controller's view).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle onto the same store that lists and watches only `node_name`
    /// (the agent's view).
    #[must_use]
    pub fn scoped_to(&self, node_name: &str) -> Self {
        Self {
            state: Arc::clone(&self.state),
            filter: Some(node_name.to_string()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a node, stamping a fresh resource version and
    /// broadcasting the change, as if an external writer went through the API
    /// server. Returns the stored copy.
    pub fn upsert(&self, node: Node) -> Node {
        let mut state = self.lock();
        let name = node.metadata.name.clone().unwrap_or_default();
        let mut stored = node;
        state.stamp(&mut stored);
        let existed = state.nodes.insert(name.clone(), stored.clone()).is_some();
        let event = if existed {
            Event::Modified(stored.clone())
        } else {
            Event::Added(stored.clone())
        };
        state.broadcast(&name, &event);
        stored
    }

    /// Removes a node and broadcasts the deletion.
    pub fn remove(&self, name: &str) {
        let mut state = self.lock();
        if let Some(node) = state.nodes.remove(name) {
            state.broadcast(name, &Event::Deleted(node));
        }
    }

    /// The stored copy of a node, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Node> {
        self.lock().nodes.get(name).cloned()
    }

    /// Annotation keys currently stored for a node, sorted.
    #[must_use]
    pub fn annotation_keys(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(|node| node.metadata.annotations)
            .map(|annotations| annotations.into_keys().collect())
            .unwrap_or_default()
    }

    /// Makes the next `update_node` call fail with a transport error.
    pub fn fail_next_update(&self) {
        self.lock().fail_next_update = true;
    }

    /// Drops every live watch stream, forcing informers to relist.
    pub fn drop_watchers(&self) {
        self.lock().watchers.clear();
    }

    fn matches(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|filter| filter == name)
    }
}

#[async_trait]
impl ListWatch<Node> for MockNodes {
    type Error = NodeClientError;

    async fn list(&self) -> Result<(Vec<Node>, String), NodeClientError> {
        let state = self.lock();
        let items = state
            .nodes
            .iter()
            .filter(|(name, _)| self.matches(name))
            .map(|(_, node)| node.clone())
            .collect();
        Ok((items, state.revision.to_string()))
    }

    async fn watch(
        &self,
        _checkpoint: &str,
    ) -> Result<BoxStream<'static, Result<Event<Node>, NodeClientError>>, NodeClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().watchers.push(MockWatcher {
            filter: self.filter.clone(),
            tx,
        });
        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }
}

#[async_trait]
impl NodeClientTrait for MockNodes {
    async fn update_node(&self, node: &Node) -> Result<Node, NodeClientError> {
        let mut state = self.lock();
        if state.fail_next_update {
            state.fail_next_update = false;
            return Err(NodeClientError::Transport(
                "injected update failure".to_string(),
            ));
        }
        let name = node
            .metadata
            .name
            .as_deref()
            .ok_or(NodeClientError::MissingName)?
            .to_string();
        let stored_version = match state.nodes.get(&name) {
            Some(stored) => stored.metadata.resource_version.clone(),
            None => return Err(NodeClientError::NotFound(name)),
        };
        if stored_version != node.metadata.resource_version {
            return Err(NodeClientError::Conflict);
        }
        let mut updated = node.clone();
        state.stamp(&mut updated);
        state.nodes.insert(name.clone(), updated.clone());
        state.broadcast(&name, &Event::Modified(updated.clone()));
        Ok(updated)
    }
}
