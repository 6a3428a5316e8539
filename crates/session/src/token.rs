//! Access-token lifecycle across the two storage scopes
//!
//! The remember-me preference selects which scope owns new writes; reads
//! fall back to the other scope and migrate what they find, so a token
//! stranded by a preference flip or a partial write heals on the next
//! read.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::expiry;
use crate::keys;
use crate::storage::{Scope, ScopePair};

/// String forms that read back as a value but mean "nothing stored".
/// Defends against accidental stringification of null-ish values upstream.
const NULL_SENTINELS: &[&str] = &["", "null", "undefined"];

/// Reject null-like sentinel forms of a stored token value
pub(crate) fn validate_raw_token(raw: &str) -> Result<&str> {
    if NULL_SENTINELS.contains(&raw.trim()) {
        Err(SessionError::InvalidToken)
    } else {
        Ok(raw)
    }
}

#[derive(Clone)]
pub(crate) struct TokenStore {
    scopes: ScopePair,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl TokenStore {
    pub fn new(scopes: ScopePair, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            scopes,
            clock,
            config,
        }
    }

    /// Store a token and its computed expiry in the preferred scope.
    ///
    /// When `remember_me` is given, the preference itself is persisted
    /// first so it also governs this write. The other scope's copies are
    /// removed; a stale duplicate left behind would shadow this write on a
    /// later fallback read.
    pub fn store(&self, token: &str, expires_in_secs: i64, remember_me: Option<bool>) {
        if let Some(remember) = remember_me {
            let value = if remember { "true" } else { "false" };
            self.scopes
                .set_or_log(Scope::Persistent, keys::REMEMBER_ME, value);
        }

        let target = self.scopes.preferred_scope();
        let expires_at_ms = self.clock.now_ms() + expires_in_secs.saturating_mul(1_000);

        self.scopes.set_or_log(target, keys::ACCESS_TOKEN, token);
        self.scopes
            .set_or_log(target, keys::TOKEN_EXPIRY, &expires_at_ms.to_string());

        let other = target.other();
        self.scopes.remove(other, keys::ACCESS_TOKEN);
        self.scopes.remove(other, keys::TOKEN_EXPIRY);
    }

    /// Current access token, if any
    pub fn get(&self) -> Option<String> {
        self.read_scoped(keys::ACCESS_TOKEN)
    }

    /// Recorded expiry of the access token, epoch milliseconds
    pub fn get_expiry(&self) -> Option<i64> {
        let raw = self.read_scoped(keys::TOKEN_EXPIRY)?;
        match raw.parse::<i64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                tracing::debug!(value = %raw, "discarding corrupt token expiry");
                self.scopes.remove_everywhere(keys::TOKEN_EXPIRY);
                None
            }
        }
    }

    /// Whether the stored token has lapsed.
    ///
    /// A missing token or missing expiry both count as expired; there is
    /// nothing to prove the session live.
    pub fn is_expired(&self) -> bool {
        if self.get().is_none() {
            return true;
        }
        match self.get_expiry() {
            Some(expires_at_ms) => expiry::is_expired(
                expires_at_ms,
                self.clock.now_ms(),
                self.config.token_expiry_buffer_ms,
            ),
            None => true,
        }
    }

    /// Store a refresh token in the preferred scope
    pub fn store_refresh_token(&self, token: &str) {
        let target = self.scopes.preferred_scope();
        self.scopes.set_or_log(target, keys::REFRESH_TOKEN, token);
        self.scopes.remove(target.other(), keys::REFRESH_TOKEN);
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.read_scoped(keys::REFRESH_TOKEN)
    }

    /// Remove token material from both scopes unconditionally
    pub fn clear(&self) {
        for key in [keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::TOKEN_EXPIRY] {
            self.scopes.remove_everywhere(key);
        }
    }

    /// Preferred-scope read with self-healing fallback.
    ///
    /// A value found only in the non-preferred scope is migrated into the
    /// preferred one so the next read is direct.
    fn read_scoped(&self, key: &str) -> Option<String> {
        let preferred = self.scopes.preferred_scope();
        if let Some(value) = self.sanitized(preferred, key) {
            return Some(value);
        }

        let fallback = preferred.other();
        let value = self.sanitized(fallback, key)?;
        tracing::debug!(key, %fallback, "serving value from fallback scope");
        if !self.scopes.set_or_log(preferred, key, &value) {
            tracing::debug!(key, "migration rejected; value stays in fallback scope");
        }
        Some(value)
    }

    fn sanitized(&self, scope: Scope, key: &str) -> Option<String> {
        let raw = self.scopes.get(scope, key)?;
        match validate_raw_token(&raw) {
            Ok(_) => Some(raw),
            Err(_) => {
                tracing::debug!(key, %scope, "treating null-like stored value as absent");
                None
            }
        }
    }
}
