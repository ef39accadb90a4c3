//! Error types for ENCRYPTEN

use crate::types::{Address, ProposalId};
use thiserror::Error;

/// Main error type for ENCRYPTEN
#[derive(Error, Debug)]
pub enum EncryptenError {
    // ============ Governance Errors ============
    #[error("Caller is not a member")]
    NotAMember,

    #[error("Invalid proposal id: {0}")]
    InvalidProposalId(ProposalId),

    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(u64),

    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    #[error("Proposal {0} is closed")]
    ProposalClosed(ProposalId),

    #[error("{voter} already voted on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: ProposalId, voter: Address },

    #[error("Admin identity cannot be revealed: {0}")]
    ConcealmentError(String),

    #[error("Governance state already initialized")]
    AlreadyInitialized,

    // ============ Request Errors ============
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // ============ State Errors ============
    #[error("State corruption detected: {0}")]
    StateCorruption(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ General Errors ============
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EncryptenError {
    /// Whether this error is a rejected governance precondition rather than an
    /// infrastructure fault
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EncryptenError::NotAMember
                | EncryptenError::InvalidProposalId(_)
                | EncryptenError::InvalidDuration(_)
                | EncryptenError::InvalidDescription(_)
                | EncryptenError::ProposalClosed(_)
                | EncryptenError::AlreadyVoted { .. }
                | EncryptenError::InvalidSignature
                | EncryptenError::InvalidPublicKey
                | EncryptenError::InvalidAddress(_)
                | EncryptenError::InvalidNonce { .. }
        )
    }
}

impl From<std::io::Error> for EncryptenError {
    fn from(err: std::io::Error) -> Self {
        EncryptenError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for EncryptenError {
    fn from(err: bincode::Error) -> Self {
        EncryptenError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for EncryptenError {
    fn from(err: serde_json::Error) -> Self {
        EncryptenError::SerializationError(err.to_string())
    }
}
