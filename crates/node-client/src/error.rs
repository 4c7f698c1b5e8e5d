//! Transport error types.

use thiserror::Error;

/// Errors surfaced by the node transport.
#[derive(Debug, Error)]
pub enum NodeClientError {
    /// Optimistic concurrency rejection: the stored node changed since the
    /// submitted copy was read. Recoverable by design — callers drop the
    /// write and rely on the next watch delivery or resync to retry with
    /// fresh state.
    #[error("update conflict: node changed since it was read")]
    Conflict,

    /// The named node does not exist in the authoritative store.
    #[error("node not found: {0}")]
    NotFound(String),

    /// The submitted node object carries no name.
    #[error("node object has no name")]
    MissingName,

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Generic transport failure (watch stream errors, injected test
    /// failures).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl NodeClientError {
    /// Whether this is an optimistic concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}
