//! Cached user-profile records and the completeness-scoring merge
//!
//! A profile is cached twice: the full serialized record, plus shadow
//! scalar copies of id and role so identity and authorization survive
//! corruption or partial eviction of the full record. When two divergent
//! copies exist, the one holding more usable data wins; recency only
//! breaks ties.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::keys;
use crate::storage::{Scope, ScopePair};
use crate::sync::SyncCoordinator;

/// Stored-profile schema version; bump when the serialized shape changes
pub const PROFILE_SCHEMA_VERSION: u32 = 1;

/// Cached user profile
///
/// The serialized form uses camelCase field names, matching what the API
/// returns, so a record cached by the app shell parses without mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Schema version of the stored record; absent in legacy records
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// When this copy was fetched from the API, epoch milliseconds
    #[serde(default)]
    pub fetched_at_ms: i64,

    /// Set when the record was rebuilt from the shadow scalars instead of
    /// read whole
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub restored: bool,
}

fn default_schema_version() -> u32 {
    PROFILE_SCHEMA_VERSION
}

impl UserProfile {
    pub fn new(id: i64, role: impl Into<String>) -> Self {
        Self {
            schema_version: PROFILE_SCHEMA_VERSION,
            id,
            role: Some(role.into()),
            first_name: None,
            last_name: None,
            email: None,
            fetched_at_ms: 0,
            restored: false,
        }
    }

    /// A profile without a usable id cannot identify anyone
    pub fn has_id(&self) -> bool {
        self.id > 0
    }
}

// Weight ordering is the contract: identity dominates authorization,
// which dominates contact, which dominates display fields. The recency
// bonus maxes out below the smallest field weight so freshness can only
// break ties, never outrank data.
const SCORE_ID: u32 = 100;
const SCORE_ROLE: u32 = 40;
const SCORE_EMAIL: u32 = 15;
const SCORE_NAME_FIELD: u32 = 5;
const SCORE_RECENCY_MAX: u32 = 4;

/// Rank how much usable data a cached profile copy holds.
///
/// A copy without an id scores zero outright; it cannot be trusted over
/// any copy that has one.
pub fn completeness_score(profile: &UserProfile, now_ms: i64, recency_horizon_ms: i64) -> u32 {
    if !profile.has_id() {
        return 0;
    }

    let mut score = SCORE_ID;
    if has_text(&profile.role) {
        score += SCORE_ROLE;
    }
    if has_text(&profile.email) {
        score += SCORE_EMAIL;
    }
    if has_text(&profile.first_name) {
        score += SCORE_NAME_FIELD;
    }
    if has_text(&profile.last_name) {
        score += SCORE_NAME_FIELD;
    }

    // Linear decay from SCORE_RECENCY_MAX at age zero down to nothing at
    // the horizon.
    let age_ms = now_ms.saturating_sub(profile.fetched_at_ms);
    if profile.fetched_at_ms > 0 && age_ms < recency_horizon_ms && recency_horizon_ms > 0 {
        let remaining = (recency_horizon_ms - age_ms) as i128;
        score += ((remaining * SCORE_RECENCY_MAX as i128) / recency_horizon_ms as i128) as u32;
    }

    score
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.trim().is_empty())
}

/// Parse a stored profile record, rejecting corrupt shapes
pub(crate) fn parse_profile(raw: &str) -> Result<UserProfile> {
    let profile: UserProfile =
        serde_json::from_str(raw).map_err(|_| SessionError::CorruptData {
            key: keys::USER_PROFILE.to_string(),
        })?;

    if !profile.has_id() {
        return Err(SessionError::CorruptData {
            key: keys::USER_PROFILE.to_string(),
        });
    }

    // A record written by a future schema cannot be trusted to mean what
    // its fields say.
    if profile.schema_version > PROFILE_SCHEMA_VERSION {
        return Err(SessionError::CorruptData {
            key: keys::USER_PROFILE.to_string(),
        });
    }

    Ok(profile)
}

/// Read one scope's full profile, discarding it if corrupt
pub(crate) fn load_profile(scopes: &ScopePair, scope: Scope) -> Option<UserProfile> {
    let raw = scopes.get(scope, keys::USER_PROFILE)?;
    match parse_profile(&raw) {
        Ok(profile) => Some(profile),
        Err(err) => {
            tracing::debug!(%scope, error = %err, "discarding corrupt profile copy");
            scopes.remove(scope, keys::USER_PROFILE);
            None
        }
    }
}

#[derive(Clone)]
pub(crate) struct ProfileStore {
    scopes: ScopePair,
    clock: Arc<dyn Clock>,
    sync: SyncCoordinator,
}

impl ProfileStore {
    pub fn new(scopes: ScopePair, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        let sync = SyncCoordinator::new(scopes.clone(), clock.clone(), config);
        Self {
            scopes,
            clock,
            sync,
        }
    }

    /// Cache a profile and propagate it across scopes.
    ///
    /// Returns false when the profile cannot identify anyone or nothing
    /// could be persisted.
    pub fn store(&self, mut profile: UserProfile) -> bool {
        if !profile.has_id() {
            tracing::debug!("refusing to cache a profile without an id");
            return false;
        }

        if profile.fetched_at_ms == 0 {
            profile.fetched_at_ms = self.clock.now_ms();
        }
        profile.schema_version = PROFILE_SCHEMA_VERSION;

        let target = self.scopes.preferred_scope();
        let mut stored = match serde_json::to_string(&profile) {
            Ok(json) => self.scopes.set_or_log(target, keys::USER_PROFILE, &json),
            Err(err) => {
                tracing::warn!(error = %err, "profile serialization failed");
                false
            }
        };

        // Shadow scalars are written independently so identity survives a
        // corrupt or evicted full record.
        stored |= self
            .scopes
            .set_or_log(target, keys::USER_ID, &profile.id.to_string());
        if let Some(role) = profile.role.as_deref() {
            stored |= self.scopes.set_or_log(target, keys::USER_ROLE, role);
        }

        self.sync.reconcile();
        stored
    }

    /// Current cached profile, repairing asymmetric state on the way.
    ///
    /// Read order: session-scope record, persistent-scope record, then a
    /// minimal reconstruction from the shadow scalars.
    pub fn get(&self) -> Option<UserProfile> {
        let session_raw = self.scopes.get(Scope::Session, keys::USER_PROFILE);
        let persistent_raw = self.scopes.get(Scope::Persistent, keys::USER_PROFILE);
        if session_raw.is_none() || session_raw != persistent_raw {
            // Missing or divergent copies; reconcile before answering.
            self.sync.reconcile();
        }

        if let Some(profile) = self.first_valid() {
            return Some(profile);
        }

        // Both copies may just have been discarded as corrupt; identity
        // can still come back from the shadow scalars.
        self.sync.reconcile();
        self.first_valid()
    }

    /// Remove the full record and its shadow scalars from both scopes
    pub fn clear(&self) {
        for key in [keys::USER_PROFILE, keys::USER_ID, keys::USER_ROLE] {
            self.scopes.remove_everywhere(key);
        }
    }

    fn first_valid(&self) -> Option<UserProfile> {
        [Scope::Session, Scope::Persistent]
            .into_iter()
            .find_map(|scope| load_profile(&self.scopes, scope))
    }
}
