//! Public session surface
//!
//! Thin composition of the token store, profile store, and reconciliation
//! pass. This is the one boundary the rest of the application talks to;
//! route guards and API wrappers must use [`SessionEngine::has_valid_auth`]
//! instead of re-deriving validity from raw token presence, since a token
//! can outlive a missing or corrupt profile.

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::expiry;
use crate::keys;
use crate::profile::{ProfileStore, UserProfile};
use crate::storage::{Scope, ScopePair, StorageArea};
use crate::token::TokenStore;

/// Authentication state derived from storage on every query.
///
/// Never stored: a session moves from `Valid` to `Expired` purely by time
/// passing, with no explicit transition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Valid,
    Expired,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Valid => write!(f, "valid"),
            AuthState::Expired => write!(f, "expired"),
        }
    }
}

/// The session synchronization engine
pub struct SessionEngine {
    tokens: TokenStore,
    profiles: ProfileStore,
    scopes: ScopePair,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionEngine {
    pub fn new(
        persistent: Arc<dyn StorageArea>,
        session: Arc<dyn StorageArea>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let scopes = ScopePair::new(persistent, session);
        Self {
            tokens: TokenStore::new(scopes.clone(), clock.clone(), config.clone()),
            profiles: ProfileStore::new(scopes.clone(), clock.clone(), config.clone()),
            scopes,
            clock,
            config,
        }
    }

    /// Engine over the given storage areas with the system clock and
    /// default policy knobs
    pub fn with_defaults(
        persistent: Arc<dyn StorageArea>,
        session: Arc<dyn StorageArea>,
    ) -> Self {
        Self::new(
            persistent,
            session,
            Arc::new(SystemClock),
            SessionConfig::default(),
        )
    }

    /// Store an access token after a login or refresh round trip
    pub fn store_token(&self, token: &str, expires_in_secs: i64, remember_me: Option<bool>) {
        self.tokens.store(token, expires_in_secs, remember_me);
    }

    /// Current access token, with self-healing fallback across scopes
    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    /// Store a refresh token alongside the access token
    pub fn store_refresh_token(&self, token: &str) {
        self.tokens.store_refresh_token(token);
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.refresh_token()
    }

    /// Whether the access token has lapsed; true when no token is stored
    pub fn is_token_expired(&self) -> bool {
        self.tokens.is_expired()
    }

    /// Cache the user profile and reconcile both scopes
    pub fn store_user_data(&self, profile: UserProfile) -> bool {
        self.profiles.store(profile)
    }

    /// Cached user profile; may be a minimal record rebuilt from the
    /// shadow scalars, marked `restored`
    pub fn user_data(&self) -> Option<UserProfile> {
        self.profiles.get()
    }

    /// The single validity predicate for external callers: token present,
    /// not expired, and an identified profile cached
    pub fn has_valid_auth(&self) -> bool {
        !self.tokens.is_expired() && self.user_data().is_some_and(|profile| profile.has_id())
    }

    /// Derived authentication state
    pub fn state(&self) -> AuthState {
        if self.has_valid_auth() {
            AuthState::Valid
        } else if self.tokens.get().is_some() {
            AuthState::Expired
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Wipe credentials and profile data from both scopes.
    ///
    /// The last-login timestamp survives; it is informational and gets
    /// superseded by the next login.
    pub fn clear_tokens(&self) {
        self.tokens.clear();
        self.profiles.clear();
        self.scopes.remove_everywhere(keys::REMEMBER_ME);
    }

    /// Record identity scalars and login timing ahead of a post-login
    /// redirect, so the grace window can bridge the gap before the full
    /// profile loads.
    pub fn mark_login_redirect(&self, user_id: i64, user_role: &str) {
        self.set_last_successful_login();
        let id = user_id.to_string();
        for scope in [Scope::Persistent, Scope::Session] {
            self.scopes.set_or_log(scope, keys::USER_ID, &id);
            self.scopes.set_or_log(scope, keys::USER_ROLE, user_role);
        }
    }

    /// Stamp the last successful login with the current time
    pub fn set_last_successful_login(&self) -> i64 {
        let now_ms = self.clock.now_ms();
        self.scopes
            .set_or_log(Scope::Persistent, keys::LAST_LOGIN, &now_ms.to_string());
        now_ms
    }

    /// Timestamp of the last successful login, epoch milliseconds
    pub fn last_successful_login(&self) -> Option<i64> {
        let raw = self.scopes.get(Scope::Persistent, keys::LAST_LOGIN)?;
        match raw.parse::<i64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                tracing::debug!(value = %raw, "discarding corrupt last-login timestamp");
                self.scopes.remove(Scope::Persistent, keys::LAST_LOGIN);
                None
            }
        }
    }

    /// Whether the last login still falls inside the grace window during
    /// which transiently missing session data is tolerated
    pub fn is_within_auth_refresh_window(&self) -> bool {
        match self.last_successful_login() {
            Some(last_login_ms) => expiry::is_within_grace_window(
                last_login_ms,
                self.clock.now_ms(),
                self.config.login_grace_window_ms,
            ),
            None => false,
        }
    }
}
