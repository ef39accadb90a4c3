//! Read-only query surface
//!
//! Every call reads committed state through the owning component. Nothing is
//! cached here, so answers never lag behind a commit.

use encrypten_core::{Address, Clock, EncryptenResult, GovernanceConfig, ProposalId, SharedClock};
use encrypten_crypto::concealment::ConcealmentKey;
use encrypten_state::StateStore;
use std::sync::Arc;

use crate::concealment::AdminConcealment;
use crate::membership::{MemberInfo, MembershipRegistry};
use crate::proposal::{ProposalDetails, ProposalStore};
use crate::vote::{VoteRecord, VotingEngine};

/// Stable read surface over the governance components
pub struct QueryFacade<S: StateStore> {
    registry: Arc<MembershipRegistry<S>>,
    proposals: Arc<ProposalStore<S>>,
    voting: Arc<VotingEngine<S>>,
    concealment: Arc<AdminConcealment<S>>,
    clock: SharedClock,
}

impl<S: StateStore> Clone for QueryFacade<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            proposals: self.proposals.clone(),
            voting: self.voting.clone(),
            concealment: self.concealment.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: StateStore> QueryFacade<S> {
    /// Build a facade over any store, such as one restored from a snapshot
    pub fn new(
        store: Arc<S>,
        config: GovernanceConfig,
        key: Option<ConcealmentKey>,
        clock: SharedClock,
    ) -> Self {
        let registry = Arc::new(MembershipRegistry::new(store.clone()));
        let proposals = Arc::new(ProposalStore::new(store.clone(), config, registry.clone()));
        let voting = Arc::new(VotingEngine::new(
            store.clone(),
            registry.clone(),
            proposals.clone(),
        ));
        let concealment = Arc::new(AdminConcealment::new(store, key));

        Self::from_parts(registry, proposals, voting, concealment, clock)
    }

    pub(crate) fn from_parts(
        registry: Arc<MembershipRegistry<S>>,
        proposals: Arc<ProposalStore<S>>,
        voting: Arc<VotingEngine<S>>,
        concealment: Arc<AdminConcealment<S>>,
        clock: SharedClock,
    ) -> Self {
        Self {
            registry,
            proposals,
            voting,
            concealment,
            clock,
        }
    }

    pub fn check_member_info(&self, identity: &Address) -> EncryptenResult<MemberInfo> {
        self.registry.check_member_info(identity)
    }

    pub fn is_member(&self, identity: &Address) -> EncryptenResult<bool> {
        self.registry.is_member(identity)
    }

    pub fn get_total_no_of_proposals(&self) -> EncryptenResult<u64> {
        self.proposals.count()
    }

    /// Details with openness evaluated at the current clock reading
    pub fn get_proposal_details(&self, id: ProposalId) -> EncryptenResult<ProposalDetails> {
        self.proposals.details(id, self.clock.now())
    }

    pub fn get_proposals(&self, offset: u64, limit: u64) -> EncryptenResult<Vec<ProposalDetails>> {
        self.proposals.page(offset, limit, self.clock.now())
    }

    pub fn check_has_voted(&self, id: ProposalId, identity: &Address) -> EncryptenResult<bool> {
        self.voting.has_voted(id, identity)
    }

    pub fn get_vote(
        &self,
        id: ProposalId,
        identity: &Address,
    ) -> EncryptenResult<Option<VoteRecord>> {
        self.voting.get_vote(id, identity)
    }

    pub fn reveal_admin(&self) -> EncryptenResult<Address> {
        self.concealment.reveal_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MemberMetadata;
    use encrypten_core::{EncryptenError, ManualClock, StateMutator, Timestamp};
    use encrypten_crypto::concealment::SealedAdmin;
    use encrypten_state::MemoryStateStore;
    use std::collections::BTreeMap;

    const ALICE: Address = Address([1u8; 32]);
    const ADMIN: Address = Address([7u8; 32]);

    #[test]
    fn test_facade_reads_committed_state() {
        let store = Arc::new(MemoryStateStore::new());
        let key = ConcealmentKey::generate();
        let clock = Arc::new(ManualClock::new(Timestamp(0)));
        let facade = QueryFacade::new(
            store.clone(),
            GovernanceConfig::default(),
            Some(key.clone()),
            clock.clone(),
        );

        let metadata: MemberMetadata = BTreeMap::from([("role".into(), "treasurer".into())]);
        facade
            .registry
            .register(ALICE, metadata, Timestamp(0))
            .unwrap();
        let sealed = SealedAdmin::seal(&ADMIN, &key).unwrap();
        store
            .apply_batch(vec![AdminConcealment::<MemoryStateStore>::seal_change(&sealed).unwrap()])
            .unwrap();

        let (_, changes) = facade
            .proposals
            .plan_create(&ALICE, "Upgrade treasury", 100, Timestamp(0))
            .unwrap();
        store.apply_batch(changes).unwrap();

        let info = facade.check_member_info(&ALICE).unwrap();
        assert!(info.is_member);
        assert_eq!(info.metadata["role"], "treasurer");
        assert_eq!(facade.get_total_no_of_proposals().unwrap(), 1);
        assert!(facade.get_proposal_details(0).unwrap().is_open);
        assert!(!facade.check_has_voted(0, &ALICE).unwrap());
        assert_eq!(facade.reveal_admin().unwrap(), ADMIN);

        clock.advance(100);
        assert!(!facade.get_proposal_details(0).unwrap().is_open);
        assert!(matches!(
            facade.get_proposal_details(1),
            Err(EncryptenError::InvalidProposalId(1))
        ));
    }
}
