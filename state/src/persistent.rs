//! Persistent state store using sled database

use encrypten_core::{
    EncryptenError, EncryptenResult, StateChange, StateMutator, StateProvider, StateVersion,
};
use parking_lot::Mutex;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use tracing::debug;

use crate::store::{StateEntry, StateStore};

const STATE_TREE: &str = "state";
const META_TREE: &str = "meta";
const VERSION_KEY: &[u8] = b"version";

fn storage_err(e: sled::Error) -> EncryptenError {
    EncryptenError::StorageError(e.to_string())
}

/// Persistent state store backed by sled database
pub struct PersistentStateStore {
    db: Db,
    state: Tree,
    meta: Tree,
    // Held across a commit so versions are assigned in order
    version: Mutex<StateVersion>,
}

impl PersistentStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> EncryptenResult<Self> {
        let db = sled::open(path).map_err(storage_err)?;
        let state = db.open_tree(STATE_TREE).map_err(storage_err)?;
        let meta = db.open_tree(META_TREE).map_err(storage_err)?;

        // Load version from disk or start at 0
        let version = match meta.get(VERSION_KEY).map_err(storage_err)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    EncryptenError::StateCorruption("version record is not 8 bytes".into())
                })?;
                StateVersion::new(u64::from_le_bytes(raw))
            }
            None => StateVersion::new(0),
        };

        debug!("Opened persistent store at {}", version);

        Ok(Self {
            db,
            state,
            meta,
            version: Mutex::new(version),
        })
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl StateProvider for PersistentStateStore {
    fn version(&self) -> StateVersion {
        *self.version.lock()
    }

    fn get(&self, key: &[u8]) -> EncryptenResult<Option<Vec<u8>>> {
        self.state
            .get(key)
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(storage_err)
    }

    fn exists(&self, key: &[u8]) -> EncryptenResult<bool> {
        self.state.contains_key(key).map_err(storage_err)
    }
}

impl StateMutator for PersistentStateStore {
    fn apply_batch(&self, changes: Vec<StateChange>) -> EncryptenResult<StateVersion> {
        let mut version = self.version.lock();
        let new_version = version.next();
        let version_bytes = new_version.0.to_le_bytes();

        // State and version land in one transaction
        (&self.state, &self.meta)
            .transaction(|(state, meta)| {
                for change in &changes {
                    match change {
                        StateChange::Set { key, value } => {
                            state.insert(key.as_slice(), value.as_slice())?;
                        }
                        StateChange::Delete { key } => {
                            state.remove(key.as_slice())?;
                        }
                    }
                }
                meta.insert(VERSION_KEY, &version_bytes[..])?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e: TransactionError<()>| {
                EncryptenError::StorageError(format!("{:?}", e))
            })?;

        self.db.flush().map_err(storage_err)?;

        *version = new_version;
        Ok(new_version)
    }
}

impl StateStore for PersistentStateStore {
    fn scan_prefix(&self, prefix: &[u8]) -> EncryptenResult<Vec<StateEntry>> {
        self.state
            .scan_prefix(prefix)
            .map(|result| {
                result
                    .map(|(key, value)| StateEntry {
                        key: key.to_vec(),
                        value: value.to_vec(),
                    })
                    .map_err(storage_err)
            })
            .collect()
    }
}
