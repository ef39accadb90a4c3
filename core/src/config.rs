//! Configuration types for ENCRYPTEN

use crate::error::EncryptenError;
use crate::traits::EncryptenResult;
use serde::{Deserialize, Serialize};

/// Governance rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Id assigned to the first proposal, 0 or 1
    pub first_proposal_id: u64,

    /// Shortest accepted voting window in seconds
    pub min_duration_secs: u64,

    /// Longest accepted voting window in seconds
    pub max_duration_secs: u64,

    /// Maximum description length in bytes
    pub max_description_len: usize,

    /// Capacity of the event channel
    pub event_buffer: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            first_proposal_id: 0,
            min_duration_secs: 1,
            max_duration_secs: 365 * 24 * 60 * 60,
            max_description_len: 4096,
            event_buffer: 100,
        }
    }
}

impl GovernanceConfig {
    /// Check internal consistency
    pub fn validate(&self) -> EncryptenResult<()> {
        if self.first_proposal_id > 1 {
            return Err(EncryptenError::ConfigError(format!(
                "first_proposal_id must be 0 or 1, got {}",
                self.first_proposal_id
            )));
        }
        if self.min_duration_secs == 0 {
            return Err(EncryptenError::ConfigError(
                "min_duration_secs must be positive".into(),
            ));
        }
        if self.min_duration_secs > self.max_duration_secs {
            return Err(EncryptenError::ConfigError(format!(
                "min_duration_secs {} exceeds max_duration_secs {}",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        if self.max_description_len == 0 {
            return Err(EncryptenError::ConfigError(
                "max_description_len must be positive".into(),
            ));
        }
        Ok(())
    }
}
