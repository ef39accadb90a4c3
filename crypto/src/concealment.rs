//! Admin identity sealing
//!
//! The admin identity is stored only as an AES-256-GCM ciphertext plus a
//! blinded commitment. Both the cipher key and the commitment blinding are
//! derived from a [`ConcealmentKey`] held outside the governance state, so
//! neither the ciphertext nor the commitment can be tested against a list of
//! candidate members without the key.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use encrypten_core::{Address, EncryptenError, EncryptenResult};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::derivation::derive_key_32;
use crate::hashing::hash_multiple;

const SEAL_AAD: &[u8] = b"ENCRYPTEN_ADMIN_SEAL:v1";
const CIPHER_INFO: &[u8] = b"encrypten/admin/cipher";
const BLINDING_INFO: &[u8] = b"encrypten/admin/blinding";

/// Secret needed to reveal the admin identity (zeroizes on drop)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ConcealmentKey {
    bytes: [u8; 32],
}

impl ConcealmentKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_hex(s: &str) -> EncryptenResult<Self> {
        let raw = Zeroizing::new(
            hex::decode(s).map_err(|e| EncryptenError::ConcealmentError(e.to_string()))?,
        );
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
            EncryptenError::ConcealmentError("concealment key must be 32 bytes".into())
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    fn cipher_key(&self, salt: &[u8]) -> EncryptenResult<Zeroizing<[u8; 32]>> {
        derive_key_32(&self.bytes, Some(salt), CIPHER_INFO).map(Zeroizing::new)
    }

    fn blinding(&self, salt: &[u8]) -> EncryptenResult<Zeroizing<[u8; 32]>> {
        derive_key_32(&self.bytes, Some(salt), BLINDING_INFO).map(Zeroizing::new)
    }
}

impl std::fmt::Debug for ConcealmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ConcealmentKey(..)")
    }
}

/// Sealed admin identity as stored in governance state
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedAdmin {
    #[serde_as(as = "Hex")]
    pub salt: [u8; 16],
    #[serde_as(as = "Hex")]
    pub nonce: [u8; 12],
    #[serde_as(as = "Hex")]
    pub ciphertext: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub commitment: [u8; 32],
}

impl SealedAdmin {
    /// Seal an identity under `key`
    pub fn seal(admin: &Address, key: &ConcealmentKey) -> EncryptenResult<Self> {
        let mut salt = [0u8; 16];
        let mut nonce = [0u8; 12];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        let cipher_key = key.cipher_key(&salt)?;
        let cipher = Aes256Gcm::new_from_slice(cipher_key.as_slice())
            .map_err(|e| EncryptenError::ConcealmentError(e.to_string()))?;
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: admin.as_bytes(),
                    aad: SEAL_AAD,
                },
            )
            .map_err(|e| EncryptenError::ConcealmentError(e.to_string()))?;

        let commitment = commit(admin, &*key.blinding(&salt)?);

        Ok(Self {
            salt,
            nonce,
            ciphertext,
            commitment,
        })
    }

    /// Decrypt and check the identity against the commitment.
    ///
    /// Fails rather than returning an identity that does not match the
    /// commitment made at sealing time.
    pub fn open(&self, key: &ConcealmentKey) -> EncryptenResult<Address> {
        let cipher_key = key.cipher_key(&self.salt)?;
        let cipher = Aes256Gcm::new_from_slice(cipher_key.as_slice())
            .map_err(|e| EncryptenError::ConcealmentError(e.to_string()))?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(
                    Nonce::from_slice(&self.nonce),
                    Payload {
                        msg: &self.ciphertext,
                        aad: SEAL_AAD,
                    },
                )
                .map_err(|_| {
                    EncryptenError::ConcealmentError("admin ciphertext failed authentication".into())
                })?,
        );

        let bytes: [u8; 32] = plaintext.as_slice().try_into().map_err(|_| {
            EncryptenError::ConcealmentError(format!(
                "sealed identity has {} bytes, expected 32",
                plaintext.len()
            ))
        })?;
        let admin = Address::from_bytes(bytes);

        if commit(&admin, &*key.blinding(&self.salt)?) != self.commitment {
            return Err(EncryptenError::ConcealmentError(
                "revealed identity does not match commitment".into(),
            ));
        }

        Ok(admin)
    }
}

fn commit(admin: &Address, blinding: &[u8; 32]) -> [u8; 32] {
    hash_multiple(&[
        &b"ENCRYPTEN_ADMIN_COMMIT:"[..],
        blinding.as_slice(),
        admin.as_bytes().as_slice(),
    ])
    .0
}
