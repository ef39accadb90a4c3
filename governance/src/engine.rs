//! Governance engine
//!
//! Applies state-changing requests one at a time. Each request is validated
//! against committed state and, if accepted, committed as a single batch.

use encrypten_core::{
    Address, Clock, EncryptenError, EncryptenResult, GovernanceConfig, Nonce, ProposalId,
    SharedClock, StateChange, StateMutator, StateProvider, Timestamp,
};
use encrypten_crypto::concealment::ConcealmentKey;
use encrypten_state::{encode_value, read_value, StateSnapshot, StateStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::concealment::AdminConcealment;
use crate::events::{create_event_channel, EventSink, GovernanceEvent};
use crate::genesis::{GenesisConfig, GenesisInitializer, GenesisRecord};
use crate::keys::nonce_key;
use crate::membership::{MemberMetadata, MembershipRegistry};
use crate::proposal::ProposalStore;
use crate::query::QueryFacade;
use crate::request::{CallOutcome, GovernanceCall, SignedRequest};
use crate::vote::VotingEngine;

/// Membership-gated governance engine
pub struct GovernanceEngine<S: StateStore> {
    config: GovernanceConfig,
    store: Arc<S>,
    clock: SharedClock,
    registry: Arc<MembershipRegistry<S>>,
    proposals: Arc<ProposalStore<S>>,
    voting: Arc<VotingEngine<S>>,
    concealment: Arc<AdminConcealment<S>>,
    // Serializes validate-then-commit so no two requests interleave
    commit_lock: Mutex<()>,
    events: EventSink,
}

impl<S: StateStore> GovernanceEngine<S> {
    /// Create an engine over a store with the given rules
    pub fn new(
        store: Arc<S>,
        config: GovernanceConfig,
        key: Option<ConcealmentKey>,
        clock: SharedClock,
    ) -> EncryptenResult<Self> {
        config.validate()?;

        let registry = Arc::new(MembershipRegistry::new(store.clone()));
        let proposals = Arc::new(ProposalStore::new(
            store.clone(),
            config.clone(),
            registry.clone(),
        ));
        let voting = Arc::new(VotingEngine::new(
            store.clone(),
            registry.clone(),
            proposals.clone(),
        ));
        let events = EventSink::default();
        let concealment = Arc::new(AdminConcealment::with_events(
            store.clone(),
            key,
            events.clone(),
        ));

        Ok(Self {
            config,
            store,
            clock,
            registry,
            proposals,
            voting,
            concealment,
            commit_lock: Mutex::new(()),
            events,
        })
    }

    /// Reopen an initialized store, taking the rules from its genesis record
    pub fn open(
        store: Arc<S>,
        key: Option<ConcealmentKey>,
        clock: SharedClock,
    ) -> EncryptenResult<Self> {
        let record = GenesisRecord::load(store.as_ref())?.ok_or_else(|| {
            EncryptenError::ConfigError("store has no genesis record".into())
        })?;
        info!("Opening governance {} at {}", record.name, store.version());
        Self::new(store, record.governance, key, clock)
    }

    /// Apply `genesis` to an empty store and start an engine on it
    pub fn from_genesis(
        store: Arc<S>,
        genesis: GenesisConfig,
        key: Option<ConcealmentKey>,
        clock: SharedClock,
    ) -> EncryptenResult<Self> {
        let governance = genesis.governance.clone();
        GenesisInitializer::new(store.clone(), genesis).initialize(clock.now())?;
        Self::new(store, governance, key, clock)
    }

    /// Set event channel. Facades already handed out by `query` emit on it too.
    pub fn set_event_channel(&mut self, tx: mpsc::Sender<GovernanceEvent>) {
        self.events.set(tx);
    }

    /// Attach a fresh channel sized from the config and return its receiver
    pub fn subscribe(&mut self) -> mpsc::Receiver<GovernanceEvent> {
        let (tx, rx) = create_event_channel(self.config.event_buffer);
        self.set_event_channel(tx);
        rx
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Read-only view sharing this engine's components
    pub fn query(&self) -> QueryFacade<S> {
        QueryFacade::from_parts(
            self.registry.clone(),
            self.proposals.clone(),
            self.voting.clone(),
            self.concealment.clone(),
            self.clock.clone(),
        )
    }

    /// Create a proposal as `caller`
    pub fn create_proposal(
        &self,
        caller: &Address,
        description: &str,
        duration: u64,
    ) -> EncryptenResult<ProposalId> {
        let _guard = self.commit_lock.lock();
        self.apply_create(caller, description, duration, Vec::new())
            .map_err(|e| self.log_failure("create_proposal", caller, e))
    }

    /// Vote on a proposal as `caller`
    pub fn vote(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
        support: bool,
    ) -> EncryptenResult<bool> {
        let _guard = self.commit_lock.lock();
        self.apply_vote(caller, proposal_id, support, Vec::new())
            .map_err(|e| self.log_failure("vote", caller, e))
    }

    /// Reveal the admin identity. Emits an event on the first reveal only.
    pub fn reveal_admin(&self) -> EncryptenResult<Address> {
        self.concealment.reveal_admin()
    }

    /// Verify and apply a signed request.
    ///
    /// The signature and nonce are checked before the call itself; the nonce
    /// is consumed in the same batch as the call's effects.
    pub fn submit(&self, request: &SignedRequest) -> EncryptenResult<CallOutcome> {
        let caller = request.caller;
        let name = request.call.name();

        request
            .verify()
            .map_err(|e| self.log_failure(name, &caller, e))?;

        let _guard = self.commit_lock.lock();

        let expected = self.nonce(&caller)?.next();
        if request.nonce != expected {
            return Err(self.log_failure(
                name,
                &caller,
                EncryptenError::InvalidNonce {
                    expected: expected.0,
                    got: request.nonce.0,
                },
            ));
        }
        let nonce_change = StateChange::set(nonce_key(&caller), encode_value(&request.nonce)?);

        let outcome = match &request.call {
            GovernanceCall::CreateProposal {
                description,
                duration,
            } => self
                .apply_create(&caller, description, *duration, vec![nonce_change])
                .map(CallOutcome::ProposalCreated),
            GovernanceCall::Vote {
                proposal_id,
                support,
            } => self
                .apply_vote(&caller, *proposal_id, *support, vec![nonce_change])
                .map(CallOutcome::Voted),
        };

        outcome.map_err(|e| self.log_failure(name, &caller, e))
    }

    /// Last nonce consumed by `address`, zero if none
    pub fn nonce(&self, address: &Address) -> EncryptenResult<Nonce> {
        Ok(read_value(self.store.as_ref(), &nonce_key(address))?.unwrap_or_default())
    }

    /// Register or reactivate a member
    pub fn register_member(
        &self,
        address: Address,
        metadata: MemberMetadata,
    ) -> EncryptenResult<()> {
        let _guard = self.commit_lock.lock();
        self.registry.register(address, metadata, self.clock.now())?;
        Ok(())
    }

    /// Deactivate a member; false if it was not active
    pub fn deactivate_member(&self, address: &Address) -> EncryptenResult<bool> {
        let _guard = self.commit_lock.lock();
        self.registry.deactivate(address)
    }

    /// Capture committed state
    pub fn snapshot(&self) -> EncryptenResult<StateSnapshot> {
        let _guard = self.commit_lock.lock();
        StateSnapshot::capture(self.store.as_ref(), self.clock.now())
    }

    fn apply_create(
        &self,
        caller: &Address,
        description: &str,
        duration: u64,
        mut changes: Vec<StateChange>,
    ) -> EncryptenResult<ProposalId> {
        let now = self.clock.now();
        let (proposal, planned) = self
            .proposals
            .plan_create(caller, description, duration, now)?;
        changes.extend(planned);

        let version = self.store.apply_batch(changes)?;

        info!(
            "Proposal {} created by {}, closes at {} ({})",
            proposal.id, caller, proposal.closing_time, version
        );

        self.emit_event(GovernanceEvent::ProposalCreated {
            id: proposal.id,
            creator: *caller,
            closing_time: proposal.closing_time,
        });

        Ok(proposal.id)
    }

    fn apply_vote(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
        support: bool,
        mut changes: Vec<StateChange>,
    ) -> EncryptenResult<bool> {
        let now = self.clock.now();
        let planned = self.voting.plan_vote(caller, proposal_id, support, now)?;
        changes.extend(planned.changes);

        let version = self.store.apply_batch(changes)?;

        info!(
            "Vote on proposal {} by {}: {} (yes={}, no={}) ({})",
            proposal_id,
            caller,
            if support { "yes" } else { "no" },
            planned.proposal.yes_count,
            planned.proposal.no_count,
            version
        );

        self.emit_event(GovernanceEvent::VoteCast {
            proposal_id,
            voter: *caller,
            support,
        });

        Ok(true)
    }

    fn log_failure(&self, call: &str, caller: &Address, e: EncryptenError) -> EncryptenError {
        if e.is_rejection() {
            debug!("Rejected {} from {}: {}", call, caller, e);
        } else {
            error!("Failed to apply {} from {}: {}", call, caller, e);
        }
        e
    }

    fn emit_event(&self, event: GovernanceEvent) {
        self.events.emit(event);
    }
}
