//! ENCRYPTEN Cryptography Module
//! 
//! Provides cryptographic primitives using standard, audited algorithms:
//! - Ed25519 for request signatures
//! - BLAKE3 for hashing and identity derivation (SHA-256 fallback)
//! - HKDF for key derivation
//! - AES-256-GCM for sealing the admin identity

pub mod keys;
pub mod signing;
pub mod hashing;
pub mod derivation;
pub mod concealment;

pub use keys::*;
pub use signing::*;
pub use hashing::*;
pub use derivation::*;
pub use concealment::*;
