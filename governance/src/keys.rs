//! State key layout
//!
//! Proposal ids are encoded big-endian so prefix scans return them in id order.

use encrypten_core::{Address, ProposalId};
use encrypten_state::compose_key;

const MEMBER_PREFIX: &[u8] = b"member:";
const PROPOSAL_PREFIX: &[u8] = b"proposal:";
const VOTE_PREFIX: &[u8] = b"vote:";
const NONCE_PREFIX: &[u8] = b"nonce:";

pub const PROPOSAL_COUNT_KEY: &[u8] = b"meta:proposal_count";
pub const GENESIS_KEY: &[u8] = b"meta:genesis";
pub const ADMIN_SEAL_KEY: &[u8] = b"admin:sealed";

pub fn member_prefix() -> &'static [u8] {
    MEMBER_PREFIX
}

pub fn member_key(address: &Address) -> Vec<u8> {
    compose_key(MEMBER_PREFIX, &[address.as_bytes().as_slice()])
}

pub fn proposal_key(id: ProposalId) -> Vec<u8> {
    compose_key(PROPOSAL_PREFIX, &[id.to_be_bytes().as_slice()])
}

/// Prefix covering every vote on one proposal
pub fn vote_prefix(id: ProposalId) -> Vec<u8> {
    compose_key(VOTE_PREFIX, &[id.to_be_bytes().as_slice()])
}

pub fn vote_key(id: ProposalId, voter: &Address) -> Vec<u8> {
    compose_key(VOTE_PREFIX, &[id.to_be_bytes().as_slice(), voter.as_bytes().as_slice()])
}

pub fn nonce_key(address: &Address) -> Vec<u8> {
    compose_key(NONCE_PREFIX, &[address.as_bytes().as_slice()])
}
