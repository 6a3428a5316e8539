//! End-to-end session lifecycle scenarios
//!
//! Each scenario drives the public facade only, the way the login flow,
//! route guards, and API wrappers do.

mod common;

use std::sync::Arc;

use common::{reload, test_session, ManualClock, RejectingStorage};
use reserva_session::{
    keys, AuthState, MemoryStorage, SessionConfig, SessionEngine, StorageArea, UserProfile,
};

#[test_log::test]
fn test_fresh_login_without_remember_me() {
    let t = test_session();

    t.engine.store_token("abc", 3_600, Some(false));
    assert!(t.engine.store_user_data(UserProfile::new(7, "client")));

    assert_eq!(t.engine.token(), Some("abc".to_string()));
    assert!(!t.engine.is_token_expired());
    assert!(t.engine.has_valid_auth());
    assert_eq!(t.engine.state(), AuthState::Valid);

    // One second past the lifetime the session is expired with no
    // explicit transition call...
    t.clock.advance_secs(3_601);
    assert!(!t.engine.has_valid_auth());
    assert_eq!(t.engine.state(), AuthState::Expired);

    // ...but the cached profile is untouched; caching and token validity
    // are independent.
    assert_eq!(t.engine.user_data().unwrap().id, 7);
}

#[test_log::test]
fn test_remember_me_session_survives_a_reload() {
    let t = test_session();
    t.engine.store_token("abc", 3_600, Some(true));
    t.engine.store_refresh_token("r1");
    t.engine.store_user_data(UserProfile::new(7, "client"));

    // A reload constructs a fresh facade over the same scopes
    let reloaded = reload(&t);
    assert_eq!(reloaded.token(), Some("abc".to_string()));
    assert_eq!(reloaded.refresh_token(), Some("r1".to_string()));
    assert!(reloaded.has_valid_auth());
}

#[test_log::test]
fn test_clear_is_total() {
    let t = test_session();
    t.engine.store_token("abc", 3_600, Some(true));
    t.engine.store_user_data(UserProfile::new(7, "client"));
    t.engine.clear_tokens();

    // A freshly-constructed facade over the same scopes finds nothing
    let fresh = reload(&t);
    assert_eq!(fresh.token(), None);
    assert_eq!(fresh.user_data(), None);
    assert!(!fresh.has_valid_auth());
    assert_eq!(fresh.state(), AuthState::Unauthenticated);
}

#[test_log::test]
fn test_token_refresh_extends_the_session() {
    let t = test_session();
    t.engine.store_token("abc", 3_600, Some(false));
    t.engine.store_user_data(UserProfile::new(7, "client"));

    t.clock.advance_secs(3_000);
    assert!(t.engine.has_valid_auth());

    // The refresh round trip replaces the token in place
    t.engine.store_token("abc2", 3_600, None);
    t.clock.advance_secs(3_000);
    assert_eq!(t.engine.token(), Some("abc2".to_string()));
    assert!(t.engine.has_valid_auth());
}

#[test_log::test]
fn test_grace_window_bridges_a_login_redirect() {
    let t = test_session();

    // The login flow records identity and timing before the redirect,
    // ahead of the profile fetch.
    t.engine.mark_login_redirect(42, "client");
    assert!(t.engine.is_within_auth_refresh_window());

    // Even with no full profile stored, identity is already answerable
    let restored = t.engine.user_data().unwrap();
    assert_eq!(restored.id, 42);
    assert!(restored.restored);

    // An hour later the window has closed
    t.clock.advance_secs(3_600);
    assert!(!t.engine.is_within_auth_refresh_window());
}

#[test_log::test]
fn test_rejecting_storage_degrades_without_panicking() {
    // Both scopes refuse all writes, as in a fully locked-down browser
    let clock = Arc::new(ManualClock::new());
    let engine = SessionEngine::new(
        Arc::new(RejectingStorage),
        Arc::new(RejectingStorage),
        clock,
        SessionConfig::default(),
    );

    engine.store_token("abc", 3_600, Some(true));
    engine.store_user_data(UserProfile::new(7, "client"));
    engine.mark_login_redirect(7, "client");

    // The worst visible symptom is a false validity answer
    assert_eq!(engine.token(), None);
    assert!(engine.is_token_expired());
    assert_eq!(engine.user_data(), None);
    assert!(!engine.is_within_auth_refresh_window());
    assert!(!engine.has_valid_auth());
    assert_eq!(engine.state(), AuthState::Unauthenticated);
}

#[test_log::test]
fn test_persistent_scope_failure_falls_back_to_session_scope() {
    let clock = Arc::new(ManualClock::new());
    let session_scope = MemoryStorage::new();
    let engine = SessionEngine::new(
        Arc::new(RejectingStorage),
        Arc::new(session_scope.clone()),
        clock,
        SessionConfig::default(),
    );

    // The remember-me preference cannot be persisted, so the session
    // scope stays authoritative and the login still succeeds there.
    engine.store_token("abc", 3_600, Some(true));
    engine.store_user_data(UserProfile::new(7, "client"));

    assert_eq!(engine.token(), Some("abc".to_string()));
    assert!(engine.has_valid_auth());
    assert_eq!(
        session_scope.get(keys::ACCESS_TOKEN),
        Some("abc".to_string())
    );
}
