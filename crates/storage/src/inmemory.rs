//! A `BTreeMap`-backed `SnapshotStore` for tests and single-process demos.

use crate::SnapshotStore;
use std::collections::BTreeMap;
use std::sync::RwLock;
use xln_types::error::StateError;

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<BTreeMap<u64, Vec<u8>>>,
    latest: RwLock<Option<u64>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn put_snapshot(&self, height: u64, blob: &[u8]) -> Result<(), StateError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StateError::Backend("snapshot map lock poisoned".to_string()))?;
        snapshots.insert(height, blob.to_vec());
        Ok(())
    }

    fn get_snapshot(&self, height: u64) -> Result<Option<Vec<u8>>, StateError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| StateError::Backend("snapshot map lock poisoned".to_string()))?;
        Ok(snapshots.get(&height).cloned())
    }

    fn set_latest_height(&self, height: u64) -> Result<(), StateError> {
        let mut latest = self
            .latest
            .write()
            .map_err(|_| StateError::Backend("latest-height lock poisoned".to_string()))?;
        *latest = Some(height);
        Ok(())
    }

    fn latest_height(&self) -> Result<Option<u64>, StateError> {
        let latest = self
            .latest
            .read()
            .map_err(|_| StateError::Backend("latest-height lock poisoned".to_string()))?;
        Ok(*latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_snapshot() {
        let store = InMemorySnapshotStore::new();
        store.put_snapshot(3, b"abc").unwrap();
        store.set_latest_height(3).unwrap();
        assert_eq!(store.get_snapshot(3).unwrap(), Some(b"abc".to_vec()));
        assert_eq!(store.latest_height().unwrap(), Some(3));
    }

    #[test]
    fn missing_height_returns_none() {
        let store = InMemorySnapshotStore::new();
        assert_eq!(store.get_snapshot(99).unwrap(), None);
        assert_eq!(store.latest_height().unwrap(), None);
    }
}
