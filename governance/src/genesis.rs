//! Genesis configuration for governance state

use encrypten_core::{
    Address, EncryptenError, EncryptenResult, GovernanceConfig, Hash, StateChange, StateMutator,
    Timestamp,
};
use encrypten_crypto::concealment::{ConcealmentKey, SealedAdmin};
use encrypten_state::{encode_value, read_value, StateStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::concealment::AdminConcealment;
use crate::keys::{GENESIS_KEY, PROPOSAL_COUNT_KEY};
use crate::membership::{Member, MemberMetadata, MembershipRegistry};

/// Initial member entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisMember {
    /// Hex-encoded address
    pub address: String,
    #[serde(default)]
    pub metadata: MemberMetadata,
}

/// Genesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Name of this governance body
    pub name: String,
    /// Initial members
    #[serde(default)]
    pub members: Vec<GenesisMember>,
    /// Admin identity, sealed before it ever reaches state
    #[serde(default)]
    pub sealed_admin: Option<SealedAdmin>,
    /// Governance rules
    #[serde(default)]
    pub governance: GovernanceConfig,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            name: "ENCRYPTEN Governance".to_string(),
            members: vec![],
            sealed_admin: None,
            governance: GovernanceConfig::default(),
        }
    }
}

impl GenesisConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Add a member
    pub fn add_member(mut self, address: &str, metadata: MemberMetadata) -> Self {
        self.members.push(GenesisMember {
            address: address.to_string(),
            metadata,
        });
        self
    }

    /// Seal `admin` under `key` and attach it
    pub fn with_admin(mut self, admin: &Address, key: &ConcealmentKey) -> EncryptenResult<Self> {
        self.sealed_admin = Some(SealedAdmin::seal(admin, key)?);
        Ok(self)
    }

    pub fn with_governance(mut self, governance: GovernanceConfig) -> Self {
        self.governance = governance;
        self
    }

    /// Parse member entries into address -> metadata
    pub fn parse_members(&self) -> EncryptenResult<BTreeMap<Address, MemberMetadata>> {
        let mut result = BTreeMap::new();

        for member in &self.members {
            let address = Address::from_hex(&member.address)
                .map_err(|e| EncryptenError::InvalidAddress(format!("{}: {}", member.address, e)))?;

            if result.insert(address, member.metadata.clone()).is_some() {
                return Err(EncryptenError::ConfigError(format!(
                    "member {} listed twice",
                    address
                )));
            }
        }

        Ok(result)
    }

    pub fn validate(&self) -> EncryptenResult<()> {
        self.governance.validate()?;
        self.parse_members()?;
        Ok(())
    }

    /// Save to JSON
    pub fn to_json(&self) -> EncryptenResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EncryptenError::SerializationError(e.to_string()))
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> EncryptenResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EncryptenError::DeserializationError(e.to_string()))
    }
}

/// Record of an applied genesis, kept in state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRecord {
    pub name: String,
    pub hash: Hash,
    pub governance: GovernanceConfig,
    pub initialized_at: Timestamp,
}

impl GenesisRecord {
    /// Load the record, `None` if genesis was never applied
    pub fn load<S: StateStore + ?Sized>(store: &S) -> EncryptenResult<Option<Self>> {
        read_value(store, GENESIS_KEY)
    }
}

/// Writes the genesis state
pub struct GenesisInitializer<S: StateStore> {
    store: Arc<S>,
    config: GenesisConfig,
}

impl<S: StateStore> GenesisInitializer<S> {
    pub fn new(store: Arc<S>, config: GenesisConfig) -> Self {
        Self { store, config }
    }

    /// Apply genesis in one batch: members, the sealed admin, an empty
    /// proposal counter and the genesis record.
    pub fn initialize(&self, now: Timestamp) -> EncryptenResult<GenesisRecord> {
        if GenesisRecord::load(self.store.as_ref())?.is_some() {
            return Err(EncryptenError::AlreadyInitialized);
        }

        self.config.validate()?;
        info!("Initializing genesis for {}", self.config.name);

        let members = self.config.parse_members()?;
        let mut changes = Vec::with_capacity(members.len() + 3);

        for (address, metadata) in members {
            let member = Member::new(address, metadata, now);
            changes.push(MembershipRegistry::<S>::record_change(&member)?);
            info!("Genesis member: {}", address);
        }

        match &self.config.sealed_admin {
            Some(sealed) => changes.push(AdminConcealment::<S>::seal_change(sealed)?),
            None => info!("Genesis has no sealed admin identity"),
        }

        let record = GenesisRecord {
            name: self.config.name.clone(),
            hash: compute_genesis_hash(&self.config)?,
            governance: self.config.governance.clone(),
            initialized_at: now,
        };
        changes.push(StateChange::set(PROPOSAL_COUNT_KEY.to_vec(), encode_value(&0u64)?));
        changes.push(StateChange::set(GENESIS_KEY.to_vec(), encode_value(&record)?));

        let version = self.store.apply_batch(changes)?;
        info!("Genesis {} applied at {}", record.hash, version);

        Ok(record)
    }
}

/// Genesis hash computation
pub fn compute_genesis_hash(config: &GenesisConfig) -> EncryptenResult<Hash> {
    let json = config.to_json()?;
    Ok(encrypten_crypto::hashing::hash(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encrypten_core::StateProvider;
    use encrypten_crypto::keys::KeyPair;
    use encrypten_state::MemoryStateStore;

    fn two_member_genesis() -> (GenesisConfig, KeyPair, KeyPair) {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let config = GenesisConfig::new("Test DAO")
            .add_member(&a.address().to_hex(), MemberMetadata::new())
            .add_member(
                &b.address().to_hex(),
                BTreeMap::from([("name".to_string(), "bob".to_string())]),
            );
        (config, a, b)
    }

    #[test]
    fn test_genesis_json() {
        let key = ConcealmentKey::generate();
        let (config, a, _) = two_member_genesis();
        let config = config.with_admin(&a.address(), &key).unwrap();

        let json = config.to_json().unwrap();
        let restored = GenesisConfig::from_json(&json).unwrap();

        assert_eq!(restored.name, "Test DAO");
        assert_eq!(restored.members.len(), 2);
        assert_eq!(restored.sealed_admin, config.sealed_admin);
        assert_eq!(restored.parse_members().unwrap(), config.parse_members().unwrap());
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config = GenesisConfig::from_json(r#"{ "name": "Bare" }"#).unwrap();

        assert!(config.members.is_empty());
        assert!(config.sealed_admin.is_none());
        assert_eq!(config.governance, GovernanceConfig::default());
    }

    #[test]
    fn test_invalid_members() {
        let bad = GenesisConfig::new("Bad").add_member("not-hex", MemberMetadata::new());
        assert!(matches!(bad.validate(), Err(EncryptenError::InvalidAddress(_))));

        let address = Address([1u8; 32]).to_hex();
        let dup = GenesisConfig::new("Dup")
            .add_member(&address, MemberMetadata::new())
            .add_member(&address, MemberMetadata::new());
        assert!(matches!(dup.validate(), Err(EncryptenError::ConfigError(_))));
    }

    #[test]
    fn test_genesis_initialization() {
        let key = ConcealmentKey::generate();
        let (config, a, b) = two_member_genesis();
        let config = config.with_admin(&a.address(), &key).unwrap();

        let store = Arc::new(MemoryStateStore::new());
        let record = GenesisInitializer::new(store.clone(), config.clone())
            .initialize(Timestamp(42))
            .unwrap();

        // One atomic batch
        assert_eq!(store.version().0, 1);
        assert_eq!(record.hash, compute_genesis_hash(&config).unwrap());
        assert_eq!(GenesisRecord::load(store.as_ref()).unwrap(), Some(record));

        let registry = MembershipRegistry::new(store.clone());
        assert!(registry.is_member(&a.address()).unwrap());
        let bob = registry.member_info(&b.address()).unwrap().unwrap();
        assert_eq!(bob.metadata["name"], "bob");
        assert_eq!(bob.joined_at, Timestamp(42));

        let concealment = AdminConcealment::new(store, Some(key));
        assert_eq!(concealment.reveal_admin().unwrap(), a.address());
    }

    #[test]
    fn test_genesis_applies_once() {
        let (config, _, _) = two_member_genesis();
        let store = Arc::new(MemoryStateStore::new());
        let initializer = GenesisInitializer::new(store.clone(), config);

        initializer.initialize(Timestamp(0)).unwrap();
        assert!(matches!(
            initializer.initialize(Timestamp(1)),
            Err(EncryptenError::AlreadyInitialized)
        ));
        assert_eq!(store.version().0, 1);
    }
}
