//! Membership registry
//!
//! Every state-changing path asks the registry directly; membership is never
//! cached, so a deactivation takes effect on the very next request.

use encrypten_core::{
    Address, EncryptenResult, StateChange, StateMutator, StateVersion, Timestamp,
};
use encrypten_state::{decode_value, encode_value, read_value, StateStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::keys::{member_key, member_prefix};

/// Free-form profile data attached to a member
pub type MemberMetadata = BTreeMap<String, String>;

/// A registered identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub active: bool,
    pub metadata: MemberMetadata,
    pub joined_at: Timestamp,
}

impl Member {
    pub fn new(address: Address, metadata: MemberMetadata, joined_at: Timestamp) -> Self {
        Self {
            address,
            active: true,
            metadata,
            joined_at,
        }
    }
}

/// Answer to a member-status query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub is_member: bool,
    pub metadata: MemberMetadata,
}

impl From<Option<Member>> for MemberInfo {
    fn from(member: Option<Member>) -> Self {
        match member {
            Some(m) => Self {
                is_member: m.active,
                metadata: m.metadata,
            },
            None => Self::default(),
        }
    }
}

/// Registry of authorized members
pub struct MembershipRegistry<S: StateStore> {
    store: Arc<S>,
}

impl<S: StateStore> MembershipRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check whether `address` is an active member
    pub fn is_member(&self, address: &Address) -> EncryptenResult<bool> {
        Ok(self.member_info(address)?.map(|m| m.active).unwrap_or(false))
    }

    /// Full record, `None` for identities never registered
    pub fn member_info(&self, address: &Address) -> EncryptenResult<Option<Member>> {
        read_value(self.store.as_ref(), &member_key(address))
    }

    /// Status and metadata; unknown identities report `is_member = false`
    pub fn check_member_info(&self, address: &Address) -> EncryptenResult<MemberInfo> {
        Ok(self.member_info(address)?.into())
    }

    /// All records ever registered, active or not
    pub fn members(&self) -> EncryptenResult<Vec<Member>> {
        self.store
            .scan_prefix(member_prefix())
            .and_then(|entries| entries.iter().map(|e| decode_value(&e.value)).collect())
    }

    /// State change writing `member`
    pub fn record_change(member: &Member) -> EncryptenResult<StateChange> {
        Ok(StateChange::set(member_key(&member.address), encode_value(member)?))
    }

    /// Register or reactivate a member, replacing its metadata
    pub fn register(
        &self,
        address: Address,
        metadata: MemberMetadata,
        joined_at: Timestamp,
    ) -> EncryptenResult<StateVersion> {
        let member = match self.member_info(&address)? {
            Some(existing) => Member {
                active: true,
                metadata,
                ..existing
            },
            None => Member::new(address, metadata, joined_at),
        };

        let version = self.store.apply_batch(vec![Self::record_change(&member)?])?;
        info!("Registered member {}", address);
        Ok(version)
    }

    /// Deactivate a member. The record is kept; returns false if unknown or
    /// already inactive.
    pub fn deactivate(&self, address: &Address) -> EncryptenResult<bool> {
        let member = match self.member_info(address)? {
            Some(m) if m.active => m,
            _ => return Ok(false),
        };

        let member = Member {
            active: false,
            ..member
        };
        self.store.apply_batch(vec![Self::record_change(&member)?])?;
        info!("Deactivated member {}", address);
        Ok(true)
    }
}
