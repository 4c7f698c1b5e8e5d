//! Node client trait for mocking
//!
//! Abstracts the authoritative node store so controllers can be unit tested
//! against an in-memory implementation. The list/watch half is the informer's
//! [`ListWatch`] supertrait; this adds the write path.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use node_informer::ListWatch;

use crate::error::NodeClientError;

/// Operations against the authoritative node store.
///
/// All async methods must be `Send` to work with Tokio's work-stealing
/// runtime.
#[async_trait]
pub trait NodeClientTrait: ListWatch<Node, Error = NodeClientError> {
    /// Persists a modified node copy.
    ///
    /// The submitted object carries the `resourceVersion` it was read at;
    /// the store rejects the write with [`NodeClientError::Conflict`] if the
    /// stored object has moved on since. Callers never mutate cached objects
    /// in place — they clone, mutate the copy, and submit it here.
    async fn update_node(&self, node: &Node) -> Result<Node, NodeClientError>;
}
