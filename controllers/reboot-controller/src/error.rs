//! Controller-specific error types.

use node_client::NodeClientError;
use thiserror::Error;

/// Errors that can occur in the Reboot Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Node transport error
    #[error("node client error: {0}")]
    Client(#[from] NodeClientError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
