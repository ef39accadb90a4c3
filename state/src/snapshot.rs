//! State snapshot functionality

use encrypten_core::{EncryptenResult, StateRoot, StateVersion, Timestamp};
use serde::{Deserialize, Serialize};

use crate::memory::MemoryStateStore;
use crate::store::{compute_state_root, decode_value, encode_value, StateEntry, StateStore};

/// A complete, self-verifying copy of committed state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Version at time of snapshot
    pub version: StateVersion,
    /// State root hash
    pub root: StateRoot,
    /// All state entries
    pub entries: Vec<StateEntry>,
    /// When the snapshot was taken
    pub taken_at: Timestamp,
}

impl StateSnapshot {
    /// Create a new snapshot from entries
    pub fn new(version: StateVersion, entries: Vec<StateEntry>, taken_at: Timestamp) -> Self {
        let root = compute_state_root(&entries);
        Self {
            version,
            root,
            entries,
            taken_at,
        }
    }

    /// Capture the committed state of any store
    pub fn capture<S: StateStore + ?Sized>(store: &S, taken_at: Timestamp) -> EncryptenResult<Self> {
        let version = store.version();
        let entries = store.all_entries()?;
        Ok(Self::new(version, entries, taken_at))
    }

    /// Verify snapshot integrity
    pub fn verify(&self) -> bool {
        compute_state_root(&self.entries) == self.root
    }

    /// Restore snapshot to a memory store
    pub fn restore(&self) -> MemoryStateStore {
        let data: Vec<(Vec<u8>, Vec<u8>)> = self
            .entries
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect();
        MemoryStateStore::with_data(self.version, data)
    }

    /// Serialize snapshot to bytes
    pub fn to_bytes(&self) -> EncryptenResult<Vec<u8>> {
        encode_value(self)
    }

    /// Deserialize snapshot from bytes
    pub fn from_bytes(bytes: &[u8]) -> EncryptenResult<Self> {
        decode_value(bytes)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encrypten_core::{StateChange, StateMutator, StateProvider};

    fn populated_store() -> MemoryStateStore {
        let store = MemoryStateStore::new();
        store
            .apply_batch(vec![
                StateChange::set(b"key1".to_vec(), b"value1".to_vec()),
                StateChange::set(b"key2".to_vec(), b"value2".to_vec()),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_capture_and_restore() {
        let store = populated_store();
        let snapshot = StateSnapshot::capture(&store, Timestamp(10)).unwrap();

        assert!(snapshot.verify());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.root, store.compute_root().unwrap());

        let restored = snapshot.restore();
        assert_eq!(restored.version(), store.version());
        assert_eq!(restored.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(restored.compute_root().unwrap(), snapshot.root);
    }

    #[test]
    fn test_bytes_survive_transport() {
        let snapshot = StateSnapshot::capture(&populated_store(), Timestamp(10)).unwrap();

        let restored = StateSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.version, snapshot.version);
        assert_eq!(restored.root, snapshot.root);
        assert!(restored.verify());
    }

    #[test]
    fn test_tampered_snapshot_fails_verification() {
        let mut snapshot = StateSnapshot::capture(&populated_store(), Timestamp(10)).unwrap();
        snapshot.entries[0].value = b"forged".to_vec();

        assert!(!snapshot.verify());
    }
}
