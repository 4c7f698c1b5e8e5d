//! The seams the informer is built around: the watch source it consumes and
//! the handler it drives.

use async_trait::async_trait;
use futures::stream::BoxStream;

/// A single change observed on the watched collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<K> {
    /// The object appeared in the collection.
    Added(K),
    /// The object changed. Coalescing may occur upstream: intermediate states
    /// are not guaranteed to be delivered.
    Modified(K),
    /// The object left the collection.
    Deleted(K),
}

impl<K> Event<K> {
    /// The object the event carries.
    pub fn object(&self) -> &K {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Deleted(obj) => obj,
        }
    }
}

/// A list+subscribe source for a resource collection.
///
/// `list` returns a full snapshot plus an opaque checkpoint; `watch` streams
/// changes from that checkpoint onwards. The source guarantees at-least-once
/// delivery of state changes but not completeness of intermediate states, and
/// the stream may end or fail at any time, after which the informer relists.
#[async_trait]
pub trait ListWatch<K>: Send + Sync {
    /// Transport-level error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches a full snapshot of the collection and a checkpoint to watch
    /// from.
    async fn list(&self) -> Result<(Vec<K>, String), Self::Error>;

    /// Opens a change stream starting at `checkpoint`.
    async fn watch(
        &self,
        checkpoint: &str,
    ) -> Result<BoxStream<'static, Result<Event<K>, Self::Error>>, Self::Error>;
}

/// Callbacks the informer drives.
///
/// Invocations are strictly sequential for a given informer, so handlers need
/// no internal locking. Handlers are infallible from the engine's point of
/// view: they own their error handling (log and rely on the next delivery).
#[async_trait]
pub trait EventHandler<K>: Send {
    /// A new object was listed or watched into the cache.
    async fn on_add(&mut self, obj: &K);

    /// An object changed, or is being re-delivered by the periodic resync (in
    /// which case `old` and `new` are identical). Handlers must not assume the
    /// two differ.
    async fn on_update(&mut self, old: &K, new: &K);

    /// An object was removed from the collection.
    async fn on_delete(&mut self, obj: &K);
}
