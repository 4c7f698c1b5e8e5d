//! The informer loop: list, watch, resync, relist.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::backoff::FibonacciBackoff;
use crate::source::{Event, EventHandler, ListWatch};
use crate::store::{ResourceKey, Store};

/// Backoff bounds for list/watch reconnection, in seconds.
const RELIST_BACKOFF_MIN: u64 = 1;
const RELIST_BACKOFF_MAX: u64 = 30;

/// Mirrors a watched collection into a [`Store`] and drives an
/// [`EventHandler`].
///
/// The loop shape:
///
/// 1. List the collection, replace the cache, deliver `on_add` for every item
///    (on a relist, diff against the cache instead: survivors get `on_update`,
///    newcomers `on_add`, vanished objects `on_delete`).
/// 2. Watch from the list checkpoint; every event updates the cache before its
///    callback fires, and `Modified` always delivers the previously cached
///    value as `old`, even when nothing actually changed.
/// 3. Every resync period, re-deliver every cached object as
///    `on_update(item, item)`.
/// 4. On stream failure or end, go back to 1. List/watch errors retry under
///    Fibonacci backoff; delete callbacks are never invoked for objects that
///    still exist.
pub struct Informer<K, S, H> {
    source: S,
    store: Store<K>,
    handler: H,
    resync_period: Duration,
    backoff: FibonacciBackoff,
}

impl<K, S, H> Informer<K, S, H>
where
    K: Clone + ResourceKey + Send + Sync,
    S: ListWatch<K>,
    H: EventHandler<K>,
{
    /// Creates an informer over `source`, mirroring into `store` and driving
    /// `handler`.
    ///
    /// The store is injected rather than owned so the handler (and anything
    /// else) can hold snapshot handles onto the same cache.
    pub fn new(source: S, store: Store<K>, handler: H, resync_period: Duration) -> Self {
        Self {
            source,
            store,
            handler,
            resync_period,
            backoff: FibonacciBackoff::new(RELIST_BACKOFF_MIN, RELIST_BACKOFF_MAX),
        }
    }

    /// Runs the informer until the process exits.
    ///
    /// Transport failures are retried internally; the returned error type
    /// exists only so callers can write the usual `?` plumbing around task
    /// joins.
    pub async fn run(mut self) -> Result<(), S::Error> {
        loop {
            let (items, checkpoint) = match self.source.list().await {
                Ok(listed) => listed,
                Err(e) => {
                    let delay = self.backoff.next_backoff();
                    warn!("list failed (retrying in {delay:?}): {e}");
                    time::sleep(delay).await;
                    continue;
                }
            };
            self.backoff.reset();
            self.replace(items).await;

            let mut events = match self.source.watch(&checkpoint).await {
                Ok(stream) => stream,
                Err(e) => {
                    let delay = self.backoff.next_backoff();
                    warn!("watch failed (relisting in {delay:?}): {e}");
                    time::sleep(delay).await;
                    continue;
                }
            };

            // The first tick fires one full period after the (re)list, not
            // immediately: the list itself already delivered everything.
            let mut resync =
                time::interval_at(Instant::now() + self.resync_period, self.resync_period);

            loop {
                tokio::select! {
                    event = events.next() => match event {
                        Some(Ok(event)) => self.apply(event).await,
                        Some(Err(e)) => {
                            warn!("watch stream failed, relisting: {e}");
                            break;
                        }
                        None => {
                            debug!("watch stream ended, relisting");
                            break;
                        }
                    },
                    _ = resync.tick() => self.resync().await,
                }
            }
        }
    }

    /// Reconciles a fresh listing against the cache.
    async fn replace(&mut self, items: Vec<K>) {
        let mut listed = BTreeSet::new();
        for item in items {
            let Some(key) = item.key().map(str::to_string) else {
                warn!("listed object without a name, skipping");
                continue;
            };
            listed.insert(key.clone());
            match self.store.insert(&key, item.clone()) {
                Some(old) => self.handler.on_update(&old, &item).await,
                None => self.handler.on_add(&item).await,
            }
        }
        // Objects that vanished while the watch was down.
        for key in self.store.keys() {
            if !listed.contains(&key) {
                if let Some(old) = self.store.remove(&key) {
                    self.handler.on_delete(&old).await;
                }
            }
        }
    }

    /// Applies one watch event: cache first, then callback.
    async fn apply(&mut self, event: Event<K>) {
        let Some(key) = event.object().key().map(str::to_string) else {
            warn!("watch event for object without a name, skipping");
            return;
        };
        match event {
            // A duplicate Added after a reconnect is delivered as an update
            // against the cached value.
            Event::Added(obj) | Event::Modified(obj) => {
                match self.store.insert(&key, obj.clone()) {
                    Some(old) => self.handler.on_update(&old, &obj).await,
                    None => self.handler.on_add(&obj).await,
                }
            }
            Event::Deleted(obj) => {
                let _ = self.store.remove(&key);
                self.handler.on_delete(&obj).await;
            }
        }
    }

    /// Re-delivers every cached object, unchanged, through the update path.
    async fn resync(&mut self) {
        let snapshot = self.store.snapshot();
        debug!("resync, re-delivering {} cached objects", snapshot.len());
        for item in snapshot {
            self.handler.on_update(&item, &item).await;
        }
    }
}
