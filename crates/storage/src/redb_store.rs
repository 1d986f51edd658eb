//! A `redb`-backed `SnapshotStore`: a single pure-Rust embedded table,
//! grounded on the reference kernel's `redb_epoch_store.rs` (open/commit
//! pattern, every `redb` error mapped through `StateError::Backend`).

use crate::{snapshot_key, SnapshotStore, LATEST_HEIGHT_KEY};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use xln_types::error::StateError;

const SNAPSHOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("SNAPSHOTS");

pub struct RedbSnapshotStore {
    db: Database,
}

impl RedbSnapshotStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let db = Database::create(path).map_err(|e| StateError::Backend(e.to_string()))?;
        {
            let write_txn = db.begin_write().map_err(|e| StateError::Backend(e.to_string()))?;
            write_txn
                .open_table(SNAPSHOTS)
                .map_err(|e| StateError::Backend(e.to_string()))?;
            write_txn.commit().map_err(|e| StateError::Backend(e.to_string()))?;
        }
        Ok(RedbSnapshotStore { db })
    }

    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StateError::Backend(e.to_string()))?;
        let table = read_txn
            .open_table(SNAPSHOTS)
            .map_err(|e| StateError::Backend(e.to_string()))?;
        let value = table
            .get(key)
            .map_err(|e| StateError::Backend(e.to_string()))?
            .map(|v| v.value().to_vec());
        Ok(value)
    }

    fn put_raw(&self, key: &str, value: &[u8]) -> Result<(), StateError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StateError::Backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOTS)
                .map_err(|e| StateError::Backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StateError::Backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }
}

impl SnapshotStore for RedbSnapshotStore {
    fn put_snapshot(&self, height: u64, blob: &[u8]) -> Result<(), StateError> {
        self.put_raw(&snapshot_key(height), blob)
    }

    fn get_snapshot(&self, height: u64) -> Result<Option<Vec<u8>>, StateError> {
        self.get_raw(&snapshot_key(height))
    }

    fn set_latest_height(&self, height: u64) -> Result<(), StateError> {
        self.put_raw(LATEST_HEIGHT_KEY, height.to_string().as_bytes())
    }

    fn latest_height(&self) -> Result<Option<u64>, StateError> {
        match self.get_raw(LATEST_HEIGHT_KEY)? {
            Some(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| StateError::Decode(e.to_string()))?;
                let height = text
                    .parse::<u64>()
                    .map_err(|e| StateError::Decode(e.to_string()))?;
                Ok(Some(height))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_snapshot_and_latest_height() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbSnapshotStore::open(dir.path().join("snapshots.redb")).unwrap();
        store.put_snapshot(5, b"snapshot-bytes").unwrap();
        store.set_latest_height(5).unwrap();
        assert_eq!(
            store.get_snapshot(5).unwrap(),
            Some(b"snapshot-bytes".to_vec())
        );
        assert_eq!(store.latest_height().unwrap(), Some(5));
    }

    #[test]
    fn missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbSnapshotStore::open(dir.path().join("snapshots.redb")).unwrap();
        assert_eq!(store.get_snapshot(42).unwrap(), None);
    }
}
