//! Hashing functions using BLAKE3 (with SHA-256 fallback)

use encrypten_core::Hash;
use sha2::{Digest, Sha256};

/// Compute BLAKE3 hash of data
pub fn blake3_hash(data: &[u8]) -> Hash {
    let hash = blake3::hash(data);
    Hash::from_bytes(*hash.as_bytes())
}

/// Compute SHA-256 hash of data (fallback)
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash::from_bytes(bytes)
}

/// Default hash function (BLAKE3)
pub fn hash(data: &[u8]) -> Hash {
    blake3_hash(data)
}

/// Hash multiple pieces of data
pub fn hash_multiple(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    let hash = hasher.finalize();
    Hash::from_bytes(*hash.as_bytes())
}

/// Merkle tree root computation
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::ZERO;
    }

    let mut current_level: Vec<Hash> = leaves.to_vec();

    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|chunk| {
                // Odd node out is paired with itself
                let right = chunk.get(1).unwrap_or(&chunk[0]);
                hash_multiple(&[chunk[0].as_bytes().as_slice(), right.as_bytes().as_slice()])
            })
            .collect();
    }

    current_level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash() {
        let data = b"Hello, ENCRYPTEN!";
        let hash1 = blake3_hash(data);
        let hash2 = blake3_hash(data);

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, Hash::ZERO);
    }

    #[test]
    fn test_different_hashes() {
        let data = b"Hello, ENCRYPTEN!";
        assert_ne!(blake3_hash(data), sha256_hash(data));
    }

    #[test]
    fn test_hash_multiple_matches_concat() {
        assert_eq!(hash_multiple(&[&b"ab"[..], &b"cd"[..]]), hash(b"abcd"));
    }

    #[test]
    fn test_merkle_root() {
        let leaves = vec![hash(b"leaf1"), hash(b"leaf2"), hash(b"leaf3")];

        let root = merkle_root(&leaves);
        assert_ne!(root, Hash::ZERO);
        assert_eq!(root, merkle_root(&leaves));

        let mut reordered = leaves.clone();
        reordered.swap(0, 1);
        assert_ne!(root, merkle_root(&reordered));
    }

    #[test]
    fn test_merkle_root_empty() {
        assert_eq!(merkle_root(&[]), Hash::ZERO);
    }

    #[test]
    fn test_merkle_root_single() {
        let leaf = hash(b"only");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }
}
