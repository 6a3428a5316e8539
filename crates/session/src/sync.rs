//! Cross-scope reconciliation
//!
//! Two tabs sharing the persistent scope can interleave writes, and either
//! scope can lose keys to eviction or a rejected write. Rather than lock,
//! the engine re-runs this pass on every profile write and on any read
//! that observes asymmetric state; the scoring rules guarantee the pass is
//! idempotent, so running it from every tab converges.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::keys;
use crate::profile::{completeness_score, load_profile, UserProfile, PROFILE_SCHEMA_VERSION};
use crate::storage::{Scope, ScopePair};

#[derive(Clone)]
pub(crate) struct SyncCoordinator {
    scopes: ScopePair,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SyncCoordinator {
    pub fn new(scopes: ScopePair, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            scopes,
            clock,
            config,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// 1. Mirror critical scalar keys into whichever scope lacks them.
    /// 2. Merge the full profile copies by completeness score.
    /// 3. Failing that, rebuild a minimal profile from the shadow scalars.
    pub fn reconcile(&self) {
        self.mirror_critical_keys();
        if !self.merge_profiles() {
            self.restore_profile_from_shadows();
        }
    }

    /// Copy each critical scalar present in exactly one scope into the
    /// other. Values present in both are left alone; cheap keys are
    /// mirrored, not scored.
    fn mirror_critical_keys(&self) {
        for key in keys::CRITICAL_KEYS {
            let persistent = self.scopes.get(Scope::Persistent, key);
            let session = self.scopes.get(Scope::Session, key);
            match (persistent, session) {
                (Some(value), None) => {
                    self.scopes.set_or_log(Scope::Session, key, &value);
                }
                (None, Some(value)) => {
                    self.scopes.set_or_log(Scope::Persistent, key, &value);
                }
                _ => {}
            }
        }
    }

    /// Merge the two full-profile copies, writing the winner to both
    /// scopes. Returns true when a full profile exists afterwards.
    fn merge_profiles(&self) -> bool {
        let session = load_profile(&self.scopes, Scope::Session);
        let persistent = load_profile(&self.scopes, Scope::Persistent);

        let winner = match (session, persistent) {
            (None, None) => return false,
            (Some(s), None) => s,
            (None, Some(p)) => p,
            (Some(s), Some(p)) => {
                if s == p {
                    // Already consistent; nothing to write.
                    return true;
                }
                let now_ms = self.clock.now_ms();
                let horizon = self.config.profile_recency_horizon_ms;
                let s_score = completeness_score(&s, now_ms, horizon);
                let p_score = completeness_score(&p, now_ms, horizon);
                if s_score != p_score {
                    if s_score > p_score {
                        s
                    } else {
                        p
                    }
                } else if s.fetched_at_ms >= p.fetched_at_ms {
                    s
                } else {
                    p
                }
            }
        };

        tracing::debug!(user_id = winner.id, "propagating winning profile copy");
        self.write_profile_everywhere(&winner);
        true
    }

    /// Synthesize a minimal restored profile when no full record survives
    /// but both shadow scalars do.
    fn restore_profile_from_shadows(&self) {
        let id = self
            .find_anywhere(keys::USER_ID)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0);
        let role = self.find_anywhere(keys::USER_ROLE);

        let (Some(id), Some(role)) = (id, role) else {
            return;
        };

        tracing::debug!(user_id = id, "rebuilding minimal profile from shadow scalars");
        let profile = UserProfile {
            schema_version: PROFILE_SCHEMA_VERSION,
            id,
            role: Some(role),
            first_name: None,
            last_name: None,
            email: None,
            fetched_at_ms: self.clock.now_ms(),
            restored: true,
        };
        // Written to both scopes so subsequent reads do not repeat the
        // reconstruction.
        self.write_profile_everywhere(&profile);
    }

    fn write_profile_everywhere(&self, profile: &UserProfile) {
        let json = match serde_json::to_string(profile) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "profile serialization failed during sync");
                return;
            }
        };
        self.scopes
            .set_or_log(Scope::Session, keys::USER_PROFILE, &json);
        self.scopes
            .set_or_log(Scope::Persistent, keys::USER_PROFILE, &json);
    }

    fn find_anywhere(&self, key: &str) -> Option<String> {
        self.scopes
            .get(Scope::Persistent, key)
            .or_else(|| self.scopes.get(Scope::Session, key))
    }
}
