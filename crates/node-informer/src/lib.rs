//! A small informer engine: list/watch a resource collection, mirror it into a
//! local cache, and drive add/update/delete callbacks.
//!
//! The engine is deliberately dumber than a workqueue-based controller
//! framework: no event deduplication, no per-key queues, no leader election.
//! One informer runs one strictly sequential reconciliation loop. Liveness
//! comes from a periodic resync that re-delivers every cached object through
//! the update callback even when nothing changed, so handlers that repair
//! state converge without depending on a missed watch event ever recurring.
//!
//! The engine is generic over the watch source ([`ListWatch`]) so the
//! transport can be swapped for an in-memory fake in tests.

mod backoff;
mod informer;
mod source;
mod store;

pub use backoff::FibonacciBackoff;
pub use informer::Informer;
pub use source::{Event, EventHandler, ListWatch};
pub use store::{ResourceKey, Store};
