//! Property-based tests for the governance engine
//!
//! Tests for:
//! - Proposal ids: dense, increasing, counted
//! - Votes: exactly once per member, tallies match records
//! - Admin reveal: stable across calls

use super::*;
use encrypten_core::{Address, EncryptenError, GovernanceConfig, ManualClock, Timestamp};
use encrypten_crypto::concealment::ConcealmentKey;
use encrypten_state::MemoryStateStore;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const MEMBERS: u8 = 5;

fn member(i: u8) -> Address {
    Address([i + 1; 32])
}

fn engine_with(
    governance: GovernanceConfig,
    admin: Option<(Address, ConcealmentKey)>,
) -> GovernanceEngine<MemoryStateStore> {
    let mut genesis = GenesisConfig::new("proptest").with_governance(governance);
    for i in 0..MEMBERS {
        genesis = genesis.add_member(&member(i).to_hex(), MemberMetadata::new());
    }
    let key = match admin {
        Some((address, key)) => {
            genesis = genesis.with_admin(&address, &key).unwrap();
            Some(key)
        }
        None => None,
    };

    GovernanceEngine::from_genesis(
        Arc::new(MemoryStateStore::new()),
        genesis,
        key,
        Arc::new(ManualClock::new(Timestamp(0))),
    )
    .unwrap()
}

proptest! {
    /// Property: ids start at the configured first id, increase by one per
    /// successful creation, and the total counts only successes
    #[test]
    fn proposal_ids_are_dense(
        first_id in 0u64..2,
        requests in prop::collection::vec((0u8..MEMBERS + 1, 0u64..5), 1..30),
    ) {
        let engine = engine_with(
            GovernanceConfig { first_proposal_id: first_id, ..Default::default() },
            None,
        );
        let mut expected = first_id;

        for (who, duration) in requests {
            // Index MEMBERS is an outsider
            let caller = member(who);
            match engine.create_proposal(&caller, "proposal", duration) {
                Ok(id) => {
                    prop_assert!(who < MEMBERS && duration > 0);
                    prop_assert_eq!(id, expected);
                    expected += 1;
                }
                Err(EncryptenError::NotAMember) => prop_assert_eq!(who, MEMBERS),
                Err(EncryptenError::InvalidDuration(0)) => prop_assert_eq!(duration, 0),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }

        prop_assert_eq!(
            engine.query().get_total_no_of_proposals().unwrap(),
            expected - first_id
        );
    }

    /// Property: every member votes at most once per proposal; has-voted flips
    /// exactly once; a duplicate leaves the tallies alone; tallies equal the
    /// number of distinct successful voters
    #[test]
    fn votes_are_counted_exactly_once(
        votes in prop::collection::vec((0u64..2, 0u8..MEMBERS + 1, any::<bool>()), 0..60),
    ) {
        let engine = engine_with(GovernanceConfig::default(), None);
        for _ in 0..2 {
            engine.create_proposal(&member(0), "proposal", 3600).unwrap();
        }
        let query = engine.query();
        let mut voted: HashSet<(u64, u8)> = HashSet::new();
        let mut tallies: HashMap<u64, (u64, u64)> = HashMap::new();

        for (id, who, support) in votes {
            let voter = member(who);
            let before = query.get_proposal_details(id).unwrap();
            let had_voted = who < MEMBERS && query.check_has_voted(id, &voter).unwrap();
            prop_assert_eq!(had_voted, voted.contains(&(id, who)));

            match engine.vote(&voter, id, support) {
                Ok(true) => {
                    prop_assert!(who < MEMBERS && !had_voted);
                    voted.insert((id, who));
                    let tally = tallies.entry(id).or_default();
                    if support { tally.0 += 1 } else { tally.1 += 1 }
                }
                Err(EncryptenError::AlreadyVoted { proposal_id, voter: v }) => {
                    prop_assert!(had_voted);
                    prop_assert_eq!(proposal_id, id);
                    prop_assert_eq!(v, voter);
                    let after = query.get_proposal_details(id).unwrap();
                    prop_assert_eq!(
                        (after.yes_count, after.no_count),
                        (before.yes_count, before.no_count)
                    );
                }
                Err(EncryptenError::NotAMember) => prop_assert_eq!(who, MEMBERS),
                other => prop_assert!(false, "unexpected result {:?}", other),
            }

            if who < MEMBERS {
                prop_assert!(query.check_has_voted(id, &voter).unwrap() == voted.contains(&(id, who)));
            }
        }

        for id in 0..2u64 {
            let details = query.get_proposal_details(id).unwrap();
            let (yes, no) = tallies.get(&id).copied().unwrap_or_default();
            let distinct = voted.iter().filter(|(p, _)| *p == id).count() as u64;

            prop_assert_eq!((details.yes_count, details.no_count), (yes, no));
            prop_assert_eq!(details.yes_count + details.no_count, distinct);
        }
    }

    /// Property: revealing twice yields the identical identity
    #[test]
    fn reveal_is_stable(admin_bytes in any::<[u8; 32]>(), key_bytes in any::<[u8; 32]>()) {
        let admin = Address(admin_bytes);
        let engine = engine_with(
            GovernanceConfig::default(),
            Some((admin, ConcealmentKey::new(key_bytes))),
        );

        let first = engine.reveal_admin().unwrap();
        let second = engine.query().reveal_admin().unwrap();

        prop_assert_eq!(first, admin);
        prop_assert_eq!(second, first);
    }
}
