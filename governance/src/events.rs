//! Governance events

use encrypten_core::{Address, ProposalId, Timestamp};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events emitted after a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceEvent {
    ProposalCreated {
        id: ProposalId,
        creator: Address,
        closing_time: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        support: bool,
    },
    /// First successful reveal of the admin identity
    AdminRevealed(Address),
}

/// Event sender shared by the engine and every component that emits.
///
/// Replacing the channel is seen by all holders, including query facades
/// handed out before the channel was attached.
#[derive(Clone, Default)]
pub(crate) struct EventSink {
    tx: Arc<RwLock<Option<mpsc::Sender<GovernanceEvent>>>>,
}

impl EventSink {
    pub(crate) fn set(&self, tx: mpsc::Sender<GovernanceEvent>) {
        *self.tx.write() = Some(tx);
    }

    /// Never blocks; a full or closed channel drops the event
    pub(crate) fn emit(&self, event: GovernanceEvent) {
        if let Some(tx) = self.tx.read().as_ref() {
            let _ = tx.try_send(event);
        }
    }
}

/// Create an event channel
pub fn create_event_channel(
    buffer: usize,
) -> (mpsc::Sender<GovernanceEvent>, mpsc::Receiver<GovernanceEvent>) {
    mpsc::channel(buffer.max(1))
}
