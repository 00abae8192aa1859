//! TTL-memoized snapshot reads.
//!
//! Repeated [`SnapshotCache::fetch`] calls inside the freshness window serve
//! the memoized snapshot without a remote round-trip; [`invalidate`] forces
//! the next fetch to go remote regardless of remaining time-to-live. The
//! completion poller invalidates before every check so it always compares
//! against live data.
//!
//! Two read paths exist on purpose:
//! - [`fetch`] keeps a failed read as an `Err`, so the poller can tell
//!   "store is down" apart from "no new rows yet";
//! - [`fetch_degraded`] is the presentation-facing read: it never fails,
//!   substituting an empty snapshot and surfacing the error alongside it.
//!
//! [`fetch`]: SnapshotCache::fetch
//! [`fetch_degraded`]: SnapshotCache::fetch_degraded
//! [`invalidate`]: SnapshotCache::invalidate

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::client::{RowSource, SheetError};
use super::snapshot::SheetSnapshot;

struct CacheEntry {
    snapshot: SheetSnapshot,
    fetched_at: Instant,
}

/// A [`RowSource`] wrapper memoizing the last good snapshot for a fixed TTL.
pub struct SnapshotCache {
    source: Arc<dyn RowSource>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl SnapshotCache {
    /// Wraps `source` with a freshness window of `ttl`.
    pub fn new(source: Arc<dyn RowSource>, ttl: Duration) -> Self {
        SnapshotCache {
            source,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Returns the current snapshot, fetching remotely only when the cached
    /// one is absent or stale.
    ///
    /// A failed remote read leaves the cache unchanged and surfaces the
    /// error to the caller.
    pub async fn fetch(&self) -> Result<SheetSnapshot, SheetError> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!(rows = cached.snapshot.len(), "serving cached snapshot");
                return Ok(cached.snapshot.clone());
            }
        }

        let snapshot = self.source.fetch_rows().await?;
        debug!(rows = snapshot.len(), "fetched fresh snapshot");
        *entry = Some(CacheEntry {
            snapshot: snapshot.clone(),
            fetched_at: Instant::now(),
        });
        Ok(snapshot)
    }

    /// Presentation-facing read: a failed fetch degrades to an empty
    /// snapshot plus the surfaced error instead of propagating.
    pub async fn fetch_degraded(&self) -> (SheetSnapshot, Option<SheetError>) {
        match self.fetch().await {
            Ok(snapshot) => (snapshot, None),
            Err(error) => {
                warn!(error = %error, "sheet read degraded to empty snapshot");
                (SheetSnapshot::empty(), Some(error))
            }
        }
    }

    /// Drops any memoized snapshot; the next [`fetch`](Self::fetch) performs
    /// a remote round-trip.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedSource, rows};

    const TTL: Duration = Duration::from_secs(120);

    #[tokio::test]
    async fn second_fetch_within_ttl_serves_cache() {
        let source = Arc::new(ScriptedSource::always(rows(2)));
        let cache = SnapshotCache::new(source.clone(), TTL);

        let first = cache.fetch().await.unwrap();
        let second = cache.fetch().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_remote_round_trip() {
        let source = Arc::new(ScriptedSource::always(rows(2)));
        let cache = SnapshotCache::new(source.clone(), TTL);

        cache.fetch().await.unwrap();
        cache.invalidate().await;
        cache.fetch().await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let source = Arc::new(ScriptedSource::always(rows(2)));
        let cache = SnapshotCache::new(source.clone(), TTL);

        cache.fetch().await.unwrap();
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        cache.fetch().await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failed_read_degrades_to_empty_with_error() {
        let source = Arc::new(ScriptedSource::always_failing("boom"));
        let cache = SnapshotCache::new(source, TTL);

        let (snapshot, error) = cache.fetch_degraded().await;
        assert!(snapshot.is_empty());
        assert!(matches!(error, Some(SheetError::Transport(_))));
    }

    #[tokio::test]
    async fn failed_read_does_not_poison_the_cache() {
        let source = Arc::new(ScriptedSource::script(vec![
            Err(SheetError::Transport("flaky".into())),
            Ok(rows(3)),
        ]));
        let cache = SnapshotCache::new(source.clone(), TTL);

        assert!(cache.fetch().await.is_err());
        let snapshot = cache.fetch().await.unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(source.calls(), 2);

        // The recovery result is now cached.
        cache.fetch().await.unwrap();
        assert_eq!(source.calls(), 2);
    }
}
