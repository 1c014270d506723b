//! In-flight read coalescing for latest-version lookups.
//!
//! N concurrent latest-reads of the same schema id must cost one backend
//! round-trip, not N. The first caller installs a shared future and spawns
//! the actual fetch as a detached task; everyone arriving while the entry is
//! in the map joins the same future. The entry is removed before the result
//! is published, and only if it still points at this operation, so a caller
//! can never join a future that has already resolved and a newer in-flight
//! operation is never evicted by a stale completion.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::oneshot;

use fluxmq_commons::{SchemaId, StoredSchema};

use crate::error::{Result, SchemaRegistryError};

/// Outcome of a latest-read, broadcast to every coalesced waiter.
pub(crate) type LatestResult = Result<Option<StoredSchema>>;

type SharedLatest = Shared<BoxFuture<'static, LatestResult>>;

/// Process-wide map of in-flight latest-reads, one slot per schema id.
pub(crate) struct ReadCoalescer {
    inflight: Arc<DashMap<SchemaId, SharedLatest>>,
}

impl ReadCoalescer {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Joins the in-flight read for `schema_id`, starting one with `fetch`
    /// only when none exists. Installation and join are a single atomic step
    /// from the perspective of other callers.
    ///
    /// The fetch runs as a detached task: waiters abandoning the returned
    /// future do not cancel the backend I/O.
    pub fn latest<F>(&self, schema_id: &SchemaId, fetch: F) -> SharedLatest
    where
        F: FnOnce() -> BoxFuture<'static, LatestResult>,
    {
        let (shared, started) = match self.inflight.entry(schema_id.clone()) {
            Entry::Occupied(slot) => (slot.get().clone(), None),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel::<LatestResult>();
                let shared: SharedLatest = rx
                    .map(|received| {
                        received.unwrap_or_else(|_| {
                            Err(SchemaRegistryError::Internal(
                                "latest-read task dropped before completing".to_string(),
                            ))
                        })
                    })
                    .boxed()
                    .shared();
                slot.insert(shared.clone());
                (shared, Some(tx))
            }
        };

        if let Some(tx) = started {
            let work = fetch();
            let inflight = Arc::clone(&self.inflight);
            let key = schema_id.clone();
            let marker = shared.clone();
            tokio::spawn(async move {
                let result = work.await;
                // Remove before publishing, and only our own entry: a later
                // operation may already occupy the slot.
                inflight.remove_if(&key, |_, current| current.ptr_eq(&marker));
                let _ = tx.send(result);
            });
        }

        shared
    }

    /// Number of reads currently in flight.
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use fluxmq_commons::SchemaVersion;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn stored(version: u64) -> StoredSchema {
        StoredSchema {
            data: Bytes::from_static(b"schema"),
            version: SchemaVersion::new(version),
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let coalescer = ReadCoalescer::new();
        let fetches = Arc::new(AtomicU64::new(0));
        let schema_id = SchemaId::new("orders");

        let fetch = |fetches: Arc<AtomicU64>| {
            move || {
                async move {
                    fetches.fetch_add(1, Ordering::Relaxed);
                    Ok(Some(stored(3)))
                }
                .boxed()
            }
        };

        let first = coalescer.latest(&schema_id, fetch(Arc::clone(&fetches)));
        let second = coalescer.latest(&schema_id, fetch(Arc::clone(&fetches)));

        let (a, b) = futures::join!(first, second);
        assert_eq!(a.unwrap().unwrap().version.get(), 3);
        assert_eq!(b.unwrap().unwrap().version.get(), 3);
        assert_eq!(fetches.load(Ordering::Relaxed), 1);
        assert_eq!(coalescer.inflight_count(), 0);
    }

    #[tokio::test]
    async fn test_completed_reads_leave_the_map() {
        let coalescer = ReadCoalescer::new();
        let fetches = Arc::new(AtomicU64::new(0));
        let schema_id = SchemaId::new("orders");

        for _ in 0..2 {
            let fetches = Arc::clone(&fetches);
            let fut = coalescer.latest(&schema_id, move || {
                async move {
                    fetches.fetch_add(1, Ordering::Relaxed);
                    Ok(None)
                }
                .boxed()
            });
            fut.await.unwrap();
        }

        // Sequential calls each ran their own fetch.
        assert_eq!(fetches.load(Ordering::Relaxed), 2);
        assert_eq!(coalescer.inflight_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let coalescer = ReadCoalescer::new();
        let schema_id = SchemaId::new("orders");

        let fut = |c: &ReadCoalescer| {
            c.latest(&schema_id, || {
                async move { Err(SchemaRegistryError::Decode("corrupt locator".into())) }.boxed()
            })
        };

        let first = fut(&coalescer);
        let second = fut(&coalescer);

        let (a, b) = futures::join!(first, second);
        assert!(matches!(a, Err(SchemaRegistryError::Decode(_))));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_coalesce() {
        let coalescer = ReadCoalescer::new();
        let fetches = Arc::new(AtomicU64::new(0));

        for key in ["a", "b"] {
            let fetches = Arc::clone(&fetches);
            let fut = coalescer.latest(&SchemaId::new(key), move || {
                async move {
                    fetches.fetch_add(1, Ordering::Relaxed);
                    Ok(None)
                }
                .boxed()
            });
            fut.await.unwrap();
        }

        assert_eq!(fetches.load(Ordering::Relaxed), 2);
    }
}
