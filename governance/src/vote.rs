//! Vote records and the exactly-once voting rule

use encrypten_core::{
    Address, EncryptenError, EncryptenResult, ProposalId, StateChange, StateProvider, Timestamp,
};
use encrypten_state::{decode_value, encode_value, read_value, StateStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keys::{vote_key, vote_prefix};
use crate::membership::MembershipRegistry;
use crate::proposal::{Proposal, ProposalStore};

/// A member's decision on one proposal. Written once, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub support: bool,
    pub cast_at: Timestamp,
}

/// Result of validating a vote: the record, the re-tallied proposal and the
/// changes that must be committed together
#[derive(Debug, Clone)]
pub struct PlannedVote {
    pub record: VoteRecord,
    pub proposal: Proposal,
    pub changes: Vec<StateChange>,
}

/// Owner of the vote-record table
pub struct VotingEngine<S: StateStore> {
    store: Arc<S>,
    registry: Arc<MembershipRegistry<S>>,
    proposals: Arc<ProposalStore<S>>,
}

impl<S: StateStore> VotingEngine<S> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<MembershipRegistry<S>>,
        proposals: Arc<ProposalStore<S>>,
    ) -> Self {
        Self {
            store,
            registry,
            proposals,
        }
    }

    /// Validate a vote. Checks run in order and the first failure wins:
    /// proposal exists, caller is a member, proposal is open, no prior vote.
    pub fn plan_vote(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
        support: bool,
        now: Timestamp,
    ) -> EncryptenResult<PlannedVote> {
        let proposal = self.proposals.get(proposal_id)?;

        if !self.registry.is_member(caller)? {
            return Err(EncryptenError::NotAMember);
        }

        if !proposal.is_open(now) {
            return Err(EncryptenError::ProposalClosed(proposal_id));
        }

        let key = vote_key(proposal_id, caller);
        if self.store.exists(&key)? {
            return Err(EncryptenError::AlreadyVoted {
                proposal_id,
                voter: *caller,
            });
        }

        let record = VoteRecord {
            proposal_id,
            voter: *caller,
            support,
            cast_at: now,
        };
        let (proposal, tally_change) = self.proposals.plan_tally(&proposal, support)?;

        // Record and tally must land in the same batch
        let changes = vec![StateChange::set(key, encode_value(&record)?), tally_change];

        Ok(PlannedVote {
            record,
            proposal,
            changes,
        })
    }

    /// Whether `voter` has voted on `proposal_id`
    pub fn has_voted(&self, proposal_id: ProposalId, voter: &Address) -> EncryptenResult<bool> {
        if !self.proposals.exists(proposal_id)? {
            return Err(EncryptenError::InvalidProposalId(proposal_id));
        }
        self.store.exists(&vote_key(proposal_id, voter))
    }

    /// The recorded vote, if any
    pub fn get_vote(
        &self,
        proposal_id: ProposalId,
        voter: &Address,
    ) -> EncryptenResult<Option<VoteRecord>> {
        if !self.proposals.exists(proposal_id)? {
            return Err(EncryptenError::InvalidProposalId(proposal_id));
        }
        read_value(self.store.as_ref(), &vote_key(proposal_id, voter))
    }

    /// Every vote on a proposal, ordered by voter address
    pub fn votes_for(&self, proposal_id: ProposalId) -> EncryptenResult<Vec<VoteRecord>> {
        if !self.proposals.exists(proposal_id)? {
            return Err(EncryptenError::InvalidProposalId(proposal_id));
        }
        self.store
            .scan_prefix(&vote_prefix(proposal_id))?
            .iter()
            .map(|e| decode_value(&e.value))
            .collect()
    }
}
