#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]
//! The snapshot persistence layer (§4.5, §6): a key-value store holding
//! `snapshot:<height>` blobs and a companion `latest_height` marker.
//!
//! [`RedbSnapshotStore`] is the production implementation, grounded on the
//! reference kernel's `redb`-backed epoch store; [`InMemorySnapshotStore`]
//! is a `BTreeMap`-backed stand-in for tests and single-process demos that
//! don't need a file on disk.

mod inmemory;
mod redb_store;

pub use inmemory::InMemorySnapshotStore;
pub use redb_store::RedbSnapshotStore;

use xln_types::error::StateError;

/// The seam the Runtime Kernel persists snapshots through (§4.5).
///
/// Keys are exactly the ones §6 specifies: `snapshot:<height>` for a
/// blob, `latest_height` for a decimal-text marker of the most recent
/// committed height.
pub trait SnapshotStore: Send + Sync {
    fn put_snapshot(&self, height: u64, blob: &[u8]) -> Result<(), StateError>;
    fn get_snapshot(&self, height: u64) -> Result<Option<Vec<u8>>, StateError>;
    fn set_latest_height(&self, height: u64) -> Result<(), StateError>;
    fn latest_height(&self) -> Result<Option<u64>, StateError>;
}

pub(crate) fn snapshot_key(height: u64) -> String {
    format!("snapshot:{height}")
}

pub(crate) const LATEST_HEIGHT_KEY: &str = "latest_height";
