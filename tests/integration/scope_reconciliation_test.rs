//! Cross-scope reconciliation scenarios
//!
//! These tests seed the two storage areas directly, simulating partial
//! writes, preference flips, and another tab's activity, then verify that
//! driving the public facade repairs the divergence.

mod common;

use common::{reload, test_session, T0};
use reserva_session::{keys, StorageArea, UserProfile};

fn seed(storage: &dyn StorageArea, profile: &UserProfile) {
    storage
        .set(keys::USER_PROFILE, &serde_json::to_string(profile).unwrap())
        .unwrap();
}

#[test_log::test]
fn test_divergent_profile_copies_are_repaired_by_a_read() {
    let t = test_session();

    let mut rich = UserProfile::new(7, "client");
    rich.email = Some("ana@example.com".to_string());
    rich.first_name = Some("Ana".to_string());
    rich.last_name = Some("Silva".to_string());
    rich.fetched_at_ms = T0;
    let mut poor = UserProfile::new(7, "client");
    poor.role = None;
    poor.fetched_at_ms = T0 - 60_000;

    seed(&t.session, &rich);
    seed(&t.persistent, &poor);

    // One read repairs both scopes
    let read = t.engine.user_data().unwrap();
    assert_eq!(read.email.as_deref(), Some("ana@example.com"));

    for storage in [&t.persistent, &t.session] {
        let raw = storage.get(keys::USER_PROFILE).unwrap();
        let kept: UserProfile = serde_json::from_str(&raw).unwrap();
        assert_eq!(kept.email.as_deref(), Some("ana@example.com"));
        assert_eq!(kept.first_name.as_deref(), Some("Ana"));
        assert_eq!(kept.last_name.as_deref(), Some("Silva"));
    }
}

#[test_log::test]
fn test_store_merges_against_the_other_scope() {
    let t = test_session();

    // A sparse copy lingers in the persistent scope from an older session
    let mut sparse = UserProfile::new(7, "client");
    sparse.fetched_at_ms = T0 - 3_600_000;
    seed(&t.persistent, &sparse);

    let mut fresh = UserProfile::new(7, "client");
    fresh.email = Some("ana@example.com".to_string());
    assert!(t.engine.store_user_data(fresh));

    let read = t.engine.user_data().unwrap();
    assert_eq!(read.email.as_deref(), Some("ana@example.com"));
    let persisted: UserProfile =
        serde_json::from_str(&t.persistent.get(keys::USER_PROFILE).unwrap()).unwrap();
    assert_eq!(persisted.email.as_deref(), Some("ana@example.com"));
}

#[test_log::test]
fn test_reconciliation_is_idempotent_across_reads() {
    let t = test_session();

    let mut profile = UserProfile::new(7, "client");
    profile.fetched_at_ms = T0;
    seed(&t.session, &profile);
    t.persistent.set(keys::USER_ID, "7").unwrap();

    // First read reconciles; the next two observe a fixed point
    let first = t.engine.user_data();
    let persistent_snapshot = t.persistent.snapshot();
    let session_snapshot = t.session.snapshot();

    let second = t.engine.user_data();
    let third = t.engine.user_data();
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(t.persistent.snapshot(), persistent_snapshot);
    assert_eq!(t.session.snapshot(), session_snapshot);
}

#[test_log::test]
fn test_shadow_scalars_scattered_across_scopes_restore_identity() {
    let t = test_session();
    t.persistent.set(keys::USER_ID, "42").unwrap();
    t.session.set(keys::USER_ROLE, "client").unwrap();

    let restored = t.engine.user_data().unwrap();
    assert_eq!(restored.id, 42);
    assert_eq!(restored.role.as_deref(), Some("client"));
    assert!(restored.restored);

    // The reconstruction is persisted; a reloaded facade reads it whole
    let fresh = reload(&t);
    let again = fresh.user_data().unwrap();
    assert_eq!(again.id, 42);
    assert!(again.restored);
}

#[test_log::test]
fn test_token_stranded_by_a_preference_flip_heals_on_read() {
    let t = test_session();

    // Another tab stored the token under remember-me, then the preference
    // was flipped off without rewriting the token.
    t.persistent.set(keys::ACCESS_TOKEN, "tok").unwrap();
    t.persistent
        .set(keys::TOKEN_EXPIRY, &(T0 + 3_600_000).to_string())
        .unwrap();
    t.persistent.set(keys::REMEMBER_ME, "false").unwrap();

    assert_eq!(t.engine.token(), Some("tok".to_string()));
    assert!(!t.engine.is_token_expired());
    // The read migrated the token into the now-preferred session scope
    assert_eq!(t.session.get(keys::ACCESS_TOKEN), Some("tok".to_string()));
}

#[test_log::test]
fn test_corrupt_copy_in_one_scope_loses_to_the_other() {
    let t = test_session();
    t.session.set(keys::USER_PROFILE, "{definitely not json").unwrap();
    let mut profile = UserProfile::new(7, "client");
    profile.fetched_at_ms = T0;
    seed(&t.persistent, &profile);

    let read = t.engine.user_data().unwrap();
    assert_eq!(read.id, 7);

    // The corrupt copy was discarded and replaced with the survivor
    let healed: UserProfile =
        serde_json::from_str(&t.session.get(keys::USER_PROFILE).unwrap()).unwrap();
    assert_eq!(healed.id, 7);
}

#[test_log::test]
fn test_interleaved_tabs_converge_on_the_newest_profile() {
    let t = test_session();

    // Tab A stores a profile, then tab B fetches a fresher one
    let mut first = UserProfile::new(7, "client");
    first.email = Some("old@example.com".to_string());
    assert!(t.engine.store_user_data(first));

    t.clock.advance_secs(60);
    let tab_b = reload(&t);
    let mut second = UserProfile::new(7, "client");
    second.email = Some("new@example.com".to_string());
    assert!(tab_b.store_user_data(second));

    // Tab A's next read sees tab B's write
    assert_eq!(
        t.engine.user_data().unwrap().email.as_deref(),
        Some("new@example.com")
    );
}
