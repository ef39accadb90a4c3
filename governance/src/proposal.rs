//! Proposal records and creation rules

use encrypten_core::{
    Address, EncryptenError, EncryptenResult, GovernanceConfig, ProposalId, StateChange,
    Timestamp,
};
use encrypten_state::{encode_value, read_value, StateStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keys::{proposal_key, PROPOSAL_COUNT_KEY};
use crate::membership::MembershipRegistry;

/// Outcome of a proposal, derived from the clock and the tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Voting window still running
    Open,
    Passed,
    Rejected,
    Tied,
}

/// A stored proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub creator: Address,
    pub created_at: Timestamp,
    pub closing_time: Timestamp,
    pub yes_count: u64,
    pub no_count: u64,
}

impl Proposal {
    /// Voting is allowed strictly before the closing time
    pub fn is_open(&self, now: Timestamp) -> bool {
        now < self.closing_time
    }

    pub fn total_votes(&self) -> u64 {
        self.yes_count + self.no_count
    }

    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        if self.is_open(now) {
            return ProposalStatus::Open;
        }
        match self.yes_count.cmp(&self.no_count) {
            std::cmp::Ordering::Greater => ProposalStatus::Passed,
            std::cmp::Ordering::Less => ProposalStatus::Rejected,
            std::cmp::Ordering::Equal => ProposalStatus::Tied,
        }
    }

    /// Copy with one more vote on the given side
    pub fn with_vote(&self, support: bool) -> Self {
        let mut updated = self.clone();
        if support {
            updated.yes_count += 1;
        } else {
            updated.no_count += 1;
        }
        updated
    }

    /// Read-time view at `now`
    pub fn details(&self, now: Timestamp) -> ProposalDetails {
        ProposalDetails {
            id: self.id,
            description: self.description.clone(),
            creator: self.creator,
            creation_time: self.created_at,
            closing_time: self.closing_time,
            yes_count: self.yes_count,
            no_count: self.no_count,
            is_open: self.is_open(now),
            status: self.status(now),
        }
    }
}

/// Proposal as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDetails {
    pub id: ProposalId,
    pub description: String,
    pub creator: Address,
    pub creation_time: Timestamp,
    pub closing_time: Timestamp,
    pub yes_count: u64,
    pub no_count: u64,
    pub is_open: bool,
    pub status: ProposalStatus,
}

/// Owner of the proposal table.
///
/// Creation is split into planning (validation plus the changes to write)
/// and commit, which the engine performs in one batch.
pub struct ProposalStore<S: StateStore> {
    store: Arc<S>,
    config: GovernanceConfig,
    registry: Arc<MembershipRegistry<S>>,
}

impl<S: StateStore> ProposalStore<S> {
    pub fn new(
        store: Arc<S>,
        config: GovernanceConfig,
        registry: Arc<MembershipRegistry<S>>,
    ) -> Self {
        Self {
            store,
            config,
            registry,
        }
    }

    /// Number of proposals ever created
    pub fn count(&self) -> EncryptenResult<u64> {
        Ok(read_value(self.store.as_ref(), PROPOSAL_COUNT_KEY)?.unwrap_or(0))
    }

    /// Id the next proposal will receive
    pub fn next_id(&self) -> EncryptenResult<ProposalId> {
        self.id_at(self.count()?)
    }

    /// Id of the proposal at position `index` in creation order
    fn id_at(&self, index: u64) -> EncryptenResult<ProposalId> {
        self.config
            .first_proposal_id
            .checked_add(index)
            .ok_or_else(|| EncryptenError::ConfigError("proposal id space exhausted".into()))
    }

    fn in_range(&self, id: ProposalId, count: u64) -> bool {
        id >= self.config.first_proposal_id && id - self.config.first_proposal_id < count
    }

    pub fn exists(&self, id: ProposalId) -> EncryptenResult<bool> {
        Ok(self.in_range(id, self.count()?))
    }

    /// Load a proposal, `InvalidProposalId` if it was never created
    pub fn get(&self, id: ProposalId) -> EncryptenResult<Proposal> {
        if !self.exists(id)? {
            return Err(EncryptenError::InvalidProposalId(id));
        }
        read_value(self.store.as_ref(), &proposal_key(id))?.ok_or_else(|| {
            EncryptenError::StateCorruption(format!("proposal {} missing from store", id))
        })
    }

    pub fn details(&self, id: ProposalId, now: Timestamp) -> EncryptenResult<ProposalDetails> {
        Ok(self.get(id)?.details(now))
    }

    /// Up to `limit` proposals in id order, skipping the first `offset`
    pub fn page(
        &self,
        offset: u64,
        limit: u64,
        now: Timestamp,
    ) -> EncryptenResult<Vec<ProposalDetails>> {
        let count = self.count()?;
        let start = offset.min(count);
        let end = start.saturating_add(limit).min(count);

        (start..end)
            .map(|index| self.details(self.id_at(index)?, now))
            .collect()
    }

    /// Validate a creation request and build the proposal with the changes
    /// that store it and bump the counter.
    pub fn plan_create(
        &self,
        caller: &Address,
        description: &str,
        duration: u64,
        now: Timestamp,
    ) -> EncryptenResult<(Proposal, Vec<StateChange>)> {
        if !self.registry.is_member(caller)? {
            return Err(EncryptenError::NotAMember);
        }

        self.check_duration(duration)?;
        let closing_time = now
            .checked_add_secs(duration)
            .ok_or(EncryptenError::InvalidDuration(duration))?;

        self.check_description(description)?;

        let count = self.count()?;
        let id = self.id_at(count)?;
        let next_count = count
            .checked_add(1)
            .ok_or_else(|| EncryptenError::ConfigError("proposal id space exhausted".into()))?;
        let proposal = Proposal {
            id,
            description: description.to_string(),
            creator: *caller,
            created_at: now,
            closing_time,
            yes_count: 0,
            no_count: 0,
        };

        let changes = vec![
            Self::record_change(&proposal)?,
            StateChange::set(PROPOSAL_COUNT_KEY.to_vec(), encode_value(&next_count)?),
        ];

        Ok((proposal, changes))
    }

    /// Updated proposal and the change that persists it
    pub fn plan_tally(
        &self,
        proposal: &Proposal,
        support: bool,
    ) -> EncryptenResult<(Proposal, StateChange)> {
        let updated = proposal.with_vote(support);
        let change = Self::record_change(&updated)?;
        Ok((updated, change))
    }

    fn record_change(proposal: &Proposal) -> EncryptenResult<StateChange> {
        Ok(StateChange::set(proposal_key(proposal.id), encode_value(proposal)?))
    }

    fn check_duration(&self, duration: u64) -> EncryptenResult<()> {
        if duration == 0
            || duration < self.config.min_duration_secs
            || duration > self.config.max_duration_secs
        {
            return Err(EncryptenError::InvalidDuration(duration));
        }
        Ok(())
    }

    fn check_description(&self, description: &str) -> EncryptenResult<()> {
        if description.trim().is_empty() {
            return Err(EncryptenError::InvalidDescription(
                "description is empty".into(),
            ));
        }
        if description.len() > self.config.max_description_len {
            return Err(EncryptenError::InvalidDescription(format!(
                "description is {} bytes, limit is {}",
                description.len(),
                self.config.max_description_len
            )));
        }
        Ok(())
    }
}
