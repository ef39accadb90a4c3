//! Signed governance requests

use encrypten_core::{
    Address, EncryptenError, EncryptenResult, Hash, Hashable, Nonce, ProposalId, PublicKey,
    Signable, Signature,
};
use encrypten_crypto::hashing::hash;
use encrypten_crypto::keys::{verify_address, KeyPair};
use encrypten_crypto::signing::{sign, verify};
use serde::{Deserialize, Serialize};

const REQUEST_DOMAIN: &[u8] = b"ENCRYPTEN_REQUEST:";

/// A state-changing governance call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceCall {
    CreateProposal { description: String, duration: u64 },
    Vote { proposal_id: ProposalId, support: bool },
}

impl GovernanceCall {
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceCall::CreateProposal { .. } => "create_proposal",
            GovernanceCall::Vote { .. } => "vote",
        }
    }

    fn encode_into(&self, msg: &mut Vec<u8>) {
        match self {
            GovernanceCall::CreateProposal {
                description,
                duration,
            } => {
                msg.push(0);
                msg.extend_from_slice(&(description.len() as u64).to_le_bytes());
                msg.extend_from_slice(description.as_bytes());
                msg.extend_from_slice(&duration.to_le_bytes());
            }
            GovernanceCall::Vote {
                proposal_id,
                support,
            } => {
                msg.push(1);
                msg.extend_from_slice(&proposal_id.to_le_bytes());
                msg.push(if *support { 1 } else { 0 });
            }
        }
    }
}

/// Result of a successfully applied call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    ProposalCreated(ProposalId),
    Voted(bool),
}

/// A call submitted under an authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedRequest {
    pub caller: Address,
    pub public_key: PublicKey,
    pub nonce: Nonce,
    pub call: GovernanceCall,
    pub signature: Signature,
}

impl SignedRequest {
    /// Build and sign a request as the owner of `keypair`
    pub fn new(call: GovernanceCall, nonce: Nonce, keypair: &KeyPair) -> Self {
        let caller = keypair.address();
        let public_key = keypair.public_key();
        let msg = Self::signing_message(&caller, nonce, &call);
        let signature = sign(keypair, &msg);

        Self {
            caller,
            public_key,
            nonce,
            call,
            signature,
        }
    }

    fn signing_message(caller: &Address, nonce: Nonce, call: &GovernanceCall) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(REQUEST_DOMAIN);
        msg.extend_from_slice(caller.as_bytes());
        msg.extend_from_slice(&nonce.0.to_le_bytes());
        call.encode_into(&mut msg);
        msg
    }

    /// Check that the caller owns the key and signed this exact request
    pub fn verify(&self) -> EncryptenResult<()> {
        if !verify_address(&self.caller, &self.public_key) {
            return Err(EncryptenError::InvalidAddress(format!(
                "{} does not match the signing key",
                self.caller
            )));
        }
        verify(&self.public_key, &self.signing_bytes(), &self.signature)
    }
}

impl Signable for SignedRequest {
    fn signing_bytes(&self) -> Vec<u8> {
        Self::signing_message(&self.caller, self.nonce, &self.call)
    }
}

impl Hashable for SignedRequest {
    fn hash(&self) -> Hash {
        let mut bytes = self.signing_bytes();
        bytes.extend_from_slice(self.signature.as_bytes());
        hash(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote_call() -> GovernanceCall {
        GovernanceCall::Vote {
            proposal_id: 0,
            support: true,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let request = SignedRequest::new(vote_call(), Nonce(1), &keypair);

        assert_eq!(request.caller, keypair.address());
        assert!(request.verify().is_ok());
    }

    #[test]
    fn test_tampered_call() {
        let keypair = KeyPair::generate();
        let mut request = SignedRequest::new(vote_call(), Nonce(1), &keypair);
        request.call = GovernanceCall::Vote {
            proposal_id: 0,
            support: false,
        };

        assert!(matches!(request.verify(), Err(EncryptenError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_nonce() {
        let keypair = KeyPair::generate();
        let mut request = SignedRequest::new(vote_call(), Nonce(1), &keypair);
        request.nonce = Nonce(2);

        assert!(matches!(request.verify(), Err(EncryptenError::InvalidSignature)));
    }

    #[test]
    fn test_impersonation() {
        let victim = KeyPair::generate();
        let attacker = KeyPair::generate();
        let mut request = SignedRequest::new(vote_call(), Nonce(1), &attacker);
        request.caller = victim.address();

        assert!(matches!(request.verify(), Err(EncryptenError::InvalidAddress(_))));
    }

    #[test]
    fn test_hash_covers_signature() {
        let keypair = KeyPair::generate();
        let a = SignedRequest::new(vote_call(), Nonce(1), &keypair);
        let b = SignedRequest::new(vote_call(), Nonce(2), &keypair);

        assert_eq!(a.hash(), a.clone().hash());
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_json_transport() {
        let keypair = KeyPair::generate();
        let request = SignedRequest::new(
            GovernanceCall::CreateProposal {
                description: "Upgrade treasury".into(),
                duration: 3600,
            },
            Nonce(1),
            &keypair,
        );

        let json = serde_json::to_string(&request).unwrap();
        let decoded: SignedRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.call, request.call);
        assert!(decoded.verify().is_ok());
    }
}
