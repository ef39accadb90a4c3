//! Core traits defining ENCRYPTEN interfaces

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Result type for ENCRYPTEN operations
pub type EncryptenResult<T> = Result<T, crate::error::EncryptenError>;

/// Trait for hashable types
pub trait Hashable {
    /// Compute the hash of this object
    fn hash(&self) -> Hash;
}

/// Trait for signable types
pub trait Signable {
    /// Get the bytes to be signed
    fn signing_bytes(&self) -> Vec<u8>;
}

/// Read access to committed state
pub trait StateProvider: Send + Sync {
    /// Get the current state version
    fn version(&self) -> StateVersion;

    /// Get a value by key
    fn get(&self, key: &[u8]) -> EncryptenResult<Option<Vec<u8>>>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> EncryptenResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Write access to state. All writes go through one atomic batch.
pub trait StateMutator: StateProvider {
    /// Apply a batch of changes atomically
    fn apply_batch(&self, changes: Vec<StateChange>) -> EncryptenResult<StateVersion>;
}

/// State change operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl StateChange {
    pub fn set(key: Vec<u8>, value: Vec<u8>) -> Self {
        StateChange::Set { key, value }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            StateChange::Set { key, .. } | StateChange::Delete { key } => key,
        }
    }
}
