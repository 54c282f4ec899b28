//! Property-Based Tests for the Share-Access Evaluator
//!
//! For any combination of owner, caller, and sharing state:
//! - the owner SHALL always be allowed;
//! - nobody else SHALL pass without a live share session;
//! - an expired session SHALL behave exactly like no session;
//! - anonymous callers SHALL only ever pass the public branch.

use chrono::{Duration, TimeZone, Utc};
use papyr_core::{evaluate_share_access, AccessDecision, EntityId, ShareType, ShareView, Timestamp};
use proptest::prelude::*;
use uuid::Uuid;

fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    // 2001..2033, second precision.
    (1_000_000_000i64..2_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn share_view_strategy() -> impl Strategy<Value = ShareView> {
    (
        prop_oneof![Just(ShareType::Public), Just(ShareType::Private)],
        proptest::option::of(timestamp_strategy()),
        proptest::collection::vec(entity_id_strategy(), 0..5),
    )
        .prop_map(|(share_type, expires_at, assigned_user_ids)| ShareView {
            share_type,
            expires_at,
            assigned_user_ids,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The owner is allowed under every possible sharing state.
    #[test]
    fn prop_owner_always_allowed(
        owner in entity_id_strategy(),
        share in proptest::option::of(share_view_strategy()),
        now in timestamp_strategy(),
    ) {
        let decision = evaluate_share_access(owner, share.as_ref(), Some(owner), now);
        prop_assert_eq!(decision, AccessDecision::Owner);
    }

    /// Without a share session, nobody but the owner is allowed.
    #[test]
    fn prop_no_share_denies_everyone_else(
        owner in entity_id_strategy(),
        caller in proptest::option::of(entity_id_strategy()),
        now in timestamp_strategy(),
    ) {
        prop_assume!(caller != Some(owner));

        let decision = evaluate_share_access(owner, None, caller, now);
        prop_assert_eq!(decision, AccessDecision::Denied);
    }

    /// An expired session decides identically to an absent one, for every
    /// caller.
    #[test]
    fn prop_expired_equals_absent(
        owner in entity_id_strategy(),
        caller in proptest::option::of(entity_id_strategy()),
        mut share in share_view_strategy(),
        now in timestamp_strategy(),
    ) {
        share.expires_at = Some(now - Duration::seconds(1));

        let with_expired = evaluate_share_access(owner, Some(&share), caller, now);
        let with_absent = evaluate_share_access(owner, None, caller, now);

        prop_assert_eq!(with_expired, with_absent);
    }

    /// A live public session admits every caller, including anonymous.
    #[test]
    fn prop_live_public_admits_all(
        owner in entity_id_strategy(),
        caller in proptest::option::of(entity_id_strategy()),
        assigned in proptest::collection::vec(entity_id_strategy(), 0..5),
        now in timestamp_strategy(),
    ) {
        let share = ShareView {
            share_type: ShareType::Public,
            expires_at: Some(now + Duration::hours(1)),
            assigned_user_ids: assigned,
        };

        let decision = evaluate_share_access(owner, Some(&share), caller, now);
        prop_assert!(decision.is_allowed());
    }

    /// A live private session admits exactly the owner and the assigned
    /// users; anonymous callers are always denied.
    #[test]
    fn prop_live_private_admits_exactly_assigned(
        owner in entity_id_strategy(),
        caller in proptest::option::of(entity_id_strategy()),
        assigned in proptest::collection::vec(entity_id_strategy(), 0..5),
        now in timestamp_strategy(),
    ) {
        let share = ShareView {
            share_type: ShareType::Private,
            expires_at: None,
            assigned_user_ids: assigned.clone(),
        };

        let decision = evaluate_share_access(owner, Some(&share), caller, now);

        let expected = match caller {
            Some(id) if id == owner => AccessDecision::Owner,
            Some(id) if assigned.contains(&id) => AccessDecision::Granted,
            _ => AccessDecision::Denied,
        };
        prop_assert_eq!(decision, expected);
    }

    /// The evaluation is a pure function of its inputs.
    #[test]
    fn prop_evaluation_is_deterministic(
        owner in entity_id_strategy(),
        caller in proptest::option::of(entity_id_strategy()),
        share in proptest::option::of(share_view_strategy()),
        now in timestamp_strategy(),
    ) {
        let first = evaluate_share_access(owner, share.as_ref(), caller, now);
        let second = evaluate_share_access(owner, share.as_ref(), caller, now);
        prop_assert_eq!(first, second);
    }
}
