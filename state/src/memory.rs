//! In-memory state store for testing and embedded use

use encrypten_core::{
    EncryptenResult, StateChange, StateMutator, StateProvider, StateVersion,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::store::{StateEntry, StateStore};

#[derive(Debug, Default, Clone)]
struct Inner {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    version: StateVersion,
}

/// In-memory state store.
///
/// Data and version sit behind a single lock, so a reader sees either all of
/// a batch or none of it.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: RwLock<Inner>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(version: StateVersion, data: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                data: data.into_iter().collect(),
                version,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }
}

impl Clone for MemoryStateStore {
    fn clone(&self) -> Self {
        Self {
            inner: RwLock::new(self.inner.read().clone()),
        }
    }
}

impl StateProvider for MemoryStateStore {
    fn version(&self) -> StateVersion {
        self.inner.read().version
    }

    fn get(&self, key: &[u8]) -> EncryptenResult<Option<Vec<u8>>> {
        Ok(self.inner.read().data.get(key).cloned())
    }
}

impl StateMutator for MemoryStateStore {
    fn apply_batch(&self, changes: Vec<StateChange>) -> EncryptenResult<StateVersion> {
        let mut inner = self.inner.write();

        for change in changes {
            match change {
                StateChange::Set { key, value } => {
                    inner.data.insert(key, value);
                }
                StateChange::Delete { key } => {
                    inner.data.remove(&key);
                }
            }
        }

        inner.version = inner.version.next();
        Ok(inner.version)
    }
}

impl StateStore for MemoryStateStore {
    fn scan_prefix(&self, prefix: &[u8]) -> EncryptenResult<Vec<StateEntry>> {
        let inner = self.inner.read();
        let entries = inner
            .data
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| StateEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_batch() {
        let store = MemoryStateStore::new();

        let changes = vec![
            StateChange::set(b"k1".to_vec(), b"v1".to_vec()),
            StateChange::set(b"k2".to_vec(), b"v2".to_vec()),
        ];

        let version = store.apply_batch(changes).unwrap();
        assert_eq!(version.0, 1);

        assert!(store.exists(b"k1").unwrap());
        assert_eq!(store.get(b"k2").unwrap(), Some(b"v2".to_vec()));

        store
            .apply_batch(vec![StateChange::Delete { key: b"k1".to_vec() }])
            .unwrap();
        assert!(!store.exists(b"k1").unwrap());
        assert_eq!(store.version().0, 2);
    }

    #[test]
    fn test_scan_prefix() {
        let store = MemoryStateStore::new();
        store
            .apply_batch(vec![
                StateChange::set(b"a:1".to_vec(), vec![1]),
                StateChange::set(b"b:1".to_vec(), vec![2]),
                StateChange::set(b"b:2".to_vec(), vec![3]),
                StateChange::set(b"c:1".to_vec(), vec![4]),
            ])
            .unwrap();

        let entries = store.scan_prefix(b"b:").unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_slice()).collect();
        assert_eq!(keys, vec![&b"b:1"[..], &b"b:2"[..]]);

        assert_eq!(store.all_entries().unwrap().len(), 4);
    }

    #[test]
    fn test_clone_is_independent() {
        let store = MemoryStateStore::new();
        store
            .apply_batch(vec![StateChange::set(b"k".to_vec(), b"v".to_vec())])
            .unwrap();

        let copy = store.clone();
        store
            .apply_batch(vec![StateChange::set(b"k".to_vec(), b"changed".to_vec())])
            .unwrap();

        assert_eq!(copy.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(copy.version().0, 1);
    }

    #[test]
    fn test_root_tracks_content() {
        let store = MemoryStateStore::new();
        let empty_root = store.compute_root().unwrap();

        store
            .apply_batch(vec![StateChange::set(b"k".to_vec(), b"v".to_vec())])
            .unwrap();
        assert_ne!(store.compute_root().unwrap(), empty_root);
    }
}
