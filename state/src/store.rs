//! Core state store traits and types

use encrypten_core::{
    EncryptenError, EncryptenResult, Hash, StateMutator, StateRoot,
};
use encrypten_crypto::hashing::{hash_multiple, merkle_root};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// State entry for merkle tree computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StateEntry {
    pub fn hash(&self) -> Hash {
        // Length prefix keeps (key, value) splits unambiguous
        let key_len = (self.key.len() as u64).to_le_bytes();
        hash_multiple(&[key_len.as_slice(), self.key.as_slice(), self.value.as_slice()])
    }
}

/// Compute state root from entries
pub fn compute_state_root(entries: &[StateEntry]) -> StateRoot {
    if entries.is_empty() {
        return Hash::ZERO;
    }

    // Sort entries by key for deterministic ordering
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let leaves: Vec<Hash> = sorted.iter().map(|e| e.hash()).collect();

    merkle_root(&leaves)
}

/// Abstract state store interface
pub trait StateStore: StateMutator {
    /// All entries whose key starts with `prefix`, in key order
    fn scan_prefix(&self, prefix: &[u8]) -> EncryptenResult<Vec<StateEntry>>;

    /// Get all entries for state root computation
    fn all_entries(&self) -> EncryptenResult<Vec<StateEntry>> {
        self.scan_prefix(&[])
    }

    /// Compute current state root
    fn compute_root(&self) -> EncryptenResult<StateRoot> {
        let entries = self.all_entries()?;
        Ok(compute_state_root(&entries))
    }
}

/// Encode a value for storage
pub fn encode_value<T: Serialize>(value: &T) -> EncryptenResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| EncryptenError::SerializationError(e.to_string()))
}

/// Decode a stored value
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> EncryptenResult<T> {
    bincode::deserialize(bytes).map_err(|e| EncryptenError::DeserializationError(e.to_string()))
}

/// Read and decode a value, `None` if the key is absent
pub fn read_value<S, T>(store: &S, key: &[u8]) -> EncryptenResult<Option<T>>
where
    S: StateStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(bytes) => Ok(Some(decode_value(&bytes)?)),
        None => Ok(None),
    }
}

/// Compose a key from a namespace prefix and parts
pub fn compose_key(prefix: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let len = prefix.len() + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_root_deterministic() {
        let entries = vec![
            StateEntry {
                key: b"key1".to_vec(),
                value: b"value1".to_vec(),
            },
            StateEntry {
                key: b"key2".to_vec(),
                value: b"value2".to_vec(),
            },
        ];

        let mut reversed = entries.clone();
        reversed.reverse();

        assert_eq!(compute_state_root(&entries), compute_state_root(&reversed));
        assert_ne!(compute_state_root(&entries), Hash::ZERO);
    }

    #[test]
    fn test_entry_hash_split_sensitive() {
        let a = StateEntry {
            key: b"ab".to_vec(),
            value: b"c".to_vec(),
        };
        let b = StateEntry {
            key: b"a".to_vec(),
            value: b"bc".to_vec(),
        };
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_compose_key() {
        let key = compose_key(b"vote:", &[1u64.to_be_bytes().as_slice(), &b"who"[..]]);
        assert_eq!(&key[..5], b"vote:");
        assert_eq!(key.len(), 5 + 8 + 3);
    }

    #[test]
    fn test_decode_garbage() {
        let result: EncryptenResult<String> = decode_value(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(EncryptenError::DeserializationError(_))));
    }
}
