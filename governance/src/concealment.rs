//! Concealed admin identity
//!
//! The sealed identity lives in state from genesis on. The key that opens it
//! is held by whoever operates the engine; without it every reveal fails.

use encrypten_core::{Address, EncryptenError, EncryptenResult, StateChange, StateProvider};
use encrypten_crypto::concealment::{ConcealmentKey, SealedAdmin};
use encrypten_state::{encode_value, read_value, StateStore};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::events::{EventSink, GovernanceEvent};
use crate::keys::ADMIN_SEAL_KEY;

/// Reveal access to the sealed admin identity
pub struct AdminConcealment<S: StateStore> {
    store: Arc<S>,
    key: Option<ConcealmentKey>,
    revealed: RwLock<Option<Address>>,
    events: EventSink,
}

impl<S: StateStore> AdminConcealment<S> {
    pub fn new(store: Arc<S>, key: Option<ConcealmentKey>) -> Self {
        Self::with_events(store, key, EventSink::default())
    }

    /// Like [`new`](Self::new), announcing the first reveal on `events`
    pub(crate) fn with_events(
        store: Arc<S>,
        key: Option<ConcealmentKey>,
        events: EventSink,
    ) -> Self {
        Self {
            store,
            key,
            revealed: RwLock::new(None),
            events,
        }
    }

    /// State change storing a seal, written once at genesis
    pub fn seal_change(sealed: &SealedAdmin) -> EncryptenResult<StateChange> {
        Ok(StateChange::set(ADMIN_SEAL_KEY.to_vec(), encode_value(sealed)?))
    }

    /// Whether a sealed identity was stored at genesis
    pub fn is_initialized(&self) -> EncryptenResult<bool> {
        self.store.exists(ADMIN_SEAL_KEY)
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed.read().is_some()
    }

    /// Decode the admin identity. Every call returns the same address.
    ///
    /// The first successful decode emits `AdminRevealed`, whichever caller
    /// performs it.
    pub fn reveal_admin(&self) -> EncryptenResult<Address> {
        if let Some(address) = *self.revealed.read() {
            return Ok(address);
        }

        let mut revealed = self.revealed.write();
        // Another reader may have finished the decode while we waited
        if let Some(address) = *revealed {
            return Ok(address);
        }

        let address = self.decode().map_err(|e| {
            warn!("Admin reveal failed: {}", e);
            e
        })?;
        *revealed = Some(address);
        info!("Admin identity revealed");
        self.events.emit(GovernanceEvent::AdminRevealed(address));
        Ok(address)
    }

    fn decode(&self) -> EncryptenResult<Address> {
        let sealed: SealedAdmin = read_value(self.store.as_ref(), ADMIN_SEAL_KEY)
            .map_err(|e| EncryptenError::ConcealmentError(format!("malformed seal: {}", e)))?
            .ok_or_else(|| {
                EncryptenError::ConcealmentError("no admin identity was sealed".into())
            })?;

        let key = self.key.as_ref().ok_or_else(|| {
            EncryptenError::ConcealmentError("concealment key unavailable".into())
        })?;

        sealed.open(key)
    }
}
