//! Key management for ENCRYPTEN
//!
//! Handles key generation and member identity derivation.

use ed25519_dalek::{
    SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
    SECRET_KEY_LENGTH,
};
use encrypten_core::{Address, EncryptenError, EncryptenResult, PublicKey};
use rand::rngs::OsRng;

use crate::hashing::blake3_hash;

/// A keypair for signing governance requests
#[derive(Clone)]
pub struct KeyPair {
    signing_key: Ed25519SigningKey,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = Ed25519SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create keypair from seed bytes
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = Ed25519SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create keypair from secret key bytes
    pub fn from_secret_bytes(bytes: &[u8]) -> EncryptenResult<Self> {
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| EncryptenError::InvalidPrivateKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        let verifying_key = self.signing_key.verifying_key();
        PublicKey::from_bytes(verifying_key.to_bytes())
    }

    /// Get the member identity (hash of public key)
    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key())
    }

    pub(crate) fn signing_key(&self) -> &Ed25519SigningKey {
        &self.signing_key
    }
}

/// Derive identity from public key using BLAKE3 hash
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let hash = blake3_hash(public_key.as_bytes());
    Address::from_bytes(*hash.as_bytes())
}

/// Verify that an identity matches a public key
pub fn verify_address(address: &Address, public_key: &PublicKey) -> bool {
    address == &address_from_public_key(public_key)
}

/// Convert our PublicKey type to Ed25519 verifying key
pub fn public_key_to_ed25519(key: &PublicKey) -> EncryptenResult<Ed25519VerifyingKey> {
    Ed25519VerifyingKey::from_bytes(key.as_bytes())
        .map_err(|_| EncryptenError::InvalidPublicKey)
}
