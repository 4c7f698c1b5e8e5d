//! Node transport for the reboot operator.
//!
//! Wraps the authoritative node store behind [`NodeClientTrait`]: a full
//! listing with a watch checkpoint, a change stream, and an optimistic
//! concurrency update (a stale write is rejected with
//! [`NodeClientError::Conflict`]). [`KubeNodes`] is the production
//! implementation over the Kubernetes API; `MockNodes` (behind the
//! `test-util` feature) is an in-memory stand-in for tests.

mod client;
mod error;
#[cfg(any(test, feature = "test-util"))]
mod mock;
mod r#trait;

pub use client::KubeNodes;
pub use error::NodeClientError;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNodes;
pub use r#trait::NodeClientTrait;
