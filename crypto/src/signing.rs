//! Digital signature operations using Ed25519

use ed25519_dalek::{Signer, Verifier};
use encrypten_core::{EncryptenError, EncryptenResult, PublicKey, Signature};

use crate::keys::{public_key_to_ed25519, KeyPair};

/// Sign a message using Ed25519
pub fn sign(keypair: &KeyPair, message: &[u8]) -> Signature {
    let signature = keypair.signing_key().sign(message);
    Signature::from_bytes(signature.to_bytes())
}

/// Verify a signature using Ed25519
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> EncryptenResult<()> {
    let verifying_key = public_key_to_ed25519(public_key)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());

    verifying_key
        .verify(message, &sig)
        .map_err(|_| EncryptenError::InvalidSignature)
}
