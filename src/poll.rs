//! Completion polling against the results store.
//!
//! After a dispatch is accepted there is no callback: the only signal that
//! the external workflow finished is new rows appearing in the sheet. The
//! poller takes a row-count baseline snapshotted before dispatch and, at a
//! fixed interval, invalidates the cache, re-reads, and compares. Three
//! terminal outcomes:
//!
//! - growth observed -> [`PollOutcome::Completed`], returned immediately;
//! - the wall-clock budget elapses first -> [`PollOutcome::TimedOut`];
//! - the store fails several reads in a row -> [`PollOutcome::ReadFailed`],
//!   so an outage is reported as an outage instead of being waited out as
//!   "not yet".
//!
//! The loop bound is wall-clock time, not iteration count; the poller never
//! blocks past the budget plus one interval. Assumes the external workflow
//! only appends - a concurrent row deletion reads as "not yet".

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{info, warn};

use crate::sheet::{SheetError, SheetSnapshot, SnapshotCache};

/// Default delay between checks (seconds).
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default wall-clock budget (seconds).
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 180;

/// Default consecutive read failures tolerated before giving up.
const DEFAULT_MAX_READ_FAILURES: u32 = 3;

/// Configuration for completion polling.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between successive checks.
    pub interval: Duration,

    /// Wall-clock budget; once elapsed, the poll ends with
    /// [`PollOutcome::TimedOut`].
    pub timeout: Duration,

    /// Consecutive read failures tolerated before the poll ends with
    /// [`PollOutcome::ReadFailed`]. A successful read resets the count.
    pub max_read_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
        }
    }
}

/// Receives wait-progress updates, once per check.
///
/// The production sink logs through `tracing`; the console layer turns the
/// same numbers into the operator-facing "elapsed / total" indicator.
pub trait ProgressSink: Send + Sync {
    fn waited(&self, elapsed: Duration, total: Duration);
}

/// A [`ProgressSink`] that logs each tick.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn waited(&self, elapsed: Duration, total: Duration) {
        info!(
            elapsed_secs = elapsed.as_secs(),
            total_secs = total.as_secs(),
            "waiting for new rows"
        );
    }
}

/// Terminal outcome of a completion poll.
///
/// `TimedOut` is not an error: it means "not yet confirmed", distinct both
/// from a dispatch failure and from `ReadFailed`.
#[derive(Debug)]
pub enum PollOutcome {
    /// A fetched snapshot grew past the baseline.
    Completed(SheetSnapshot),

    /// The budget elapsed without observed growth; carries the last
    /// successfully fetched snapshot.
    TimedOut(SheetSnapshot),

    /// The store failed too many reads in a row; carries the final error
    /// and the last successfully fetched snapshot.
    ReadFailed {
        error: SheetError,
        snapshot: SheetSnapshot,
    },
}

/// Polls until the store's row count exceeds `baseline` or the budget runs
/// out.
///
/// Each iteration sleeps one interval, invalidates the cache, and fetches
/// fresh - so the comparison always runs against live data. A check that
/// lands exactly on the deadline still counts: growth observed there returns
/// `Completed`, not `TimedOut`.
pub async fn await_growth(
    cache: &SnapshotCache,
    baseline: usize,
    config: &PollConfig,
    progress: &dyn ProgressSink,
) -> PollOutcome {
    let started = Instant::now();
    let deadline = started + config.timeout;
    let mut last_snapshot = SheetSnapshot::empty();
    let mut consecutive_failures: u32 = 0;

    loop {
        time::sleep(config.interval).await;

        cache.invalidate().await;
        match cache.fetch().await {
            Ok(snapshot) => {
                consecutive_failures = 0;
                if snapshot.len() > baseline {
                    info!(
                        rows = snapshot.len(),
                        baseline,
                        elapsed_secs = started.elapsed().as_secs(),
                        "new rows confirmed"
                    );
                    return PollOutcome::Completed(snapshot);
                }
                last_snapshot = snapshot;
            }
            Err(error) => {
                consecutive_failures += 1;
                warn!(
                    error = %error,
                    consecutive_failures,
                    "sheet read failed during poll"
                );
                if consecutive_failures >= config.max_read_failures {
                    return PollOutcome::ReadFailed {
                        error,
                        snapshot: last_snapshot,
                    };
                }
            }
        }

        progress.waited(started.elapsed(), config.timeout);

        if Instant::now() >= deadline {
            info!(
                baseline,
                timeout_secs = config.timeout.as_secs(),
                "poll budget elapsed without growth"
            );
            return PollOutcome::TimedOut(last_snapshot);
        }
    }
}
