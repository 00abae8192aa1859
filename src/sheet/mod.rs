//! The results store: spreadsheet reads, snapshots, and the TTL cache.
//!
//! The external spreadsheet is the sole system of record; this module only
//! ever reads it. [`SheetsClient`] performs the remote read, [`SheetSnapshot`]
//! is the point-in-time copy, and [`SnapshotCache`] memoizes it.

pub mod cache;
pub mod client;
pub mod snapshot;

pub use cache::SnapshotCache;
pub use client::{RowSource, SheetError, SheetsClient};
pub use snapshot::SheetSnapshot;
