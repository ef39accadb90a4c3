//! ENCRYPTEN Governance Engine
//! 
//! Membership-gated proposals and voting:
//! - Sequential, time-bounded proposals created by members
//! - Exactly-once voting per member per proposal
//! - Admin identity sealed at genesis, revealed on demand
//! - Read-only query surface over committed state

pub mod concealment;
pub mod engine;
pub mod events;
pub mod genesis;
pub mod keys;
pub mod membership;
pub mod proposal;
pub mod query;
pub mod request;
pub mod vote;

#[cfg(test)]
mod proptests;

pub use concealment::*;
pub use engine::*;
pub use events::*;
pub use genesis::*;
pub use membership::*;
pub use proposal::*;
pub use query::*;
pub use request::*;
pub use vote::*;
