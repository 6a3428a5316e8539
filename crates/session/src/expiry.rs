//! Expiry and grace-window policy
//!
//! Pure time arithmetic; no storage access. The stores pass timestamps in
//! and act on the boolean answers.

/// Safety margin subtracted from the recorded expiry. A token about to
/// expire is treated as already expired so a request issued now cannot be
/// rejected server-side by the time it arrives.
pub const TOKEN_EXPIRY_BUFFER_MS: i64 = 5_000;

/// Sliding window after a successful login during which transiently
/// missing session data is tolerated instead of forcing re-authentication.
pub const LOGIN_GRACE_WINDOW_MS: i64 = 3_600_000;

/// Profile data older than this earns no recency bonus when scored.
pub const PROFILE_RECENCY_HORIZON_MS: i64 = 86_400_000;

/// Whether a token with the given expiry has lapsed at `now_ms`.
///
/// Expiry is always compared with the buffer applied; nothing in the
/// engine consults the raw timestamp with less caution.
pub fn is_expired(expires_at_ms: i64, now_ms: i64, buffer_ms: i64) -> bool {
    now_ms >= expires_at_ms - buffer_ms
}

/// Whether a prior login at `last_login_ms` still falls inside the
/// sliding grace window at `now_ms`.
pub fn is_within_grace_window(last_login_ms: i64, now_ms: i64, window_ms: i64) -> bool {
    now_ms.saturating_sub(last_login_ms) < window_ms
}
