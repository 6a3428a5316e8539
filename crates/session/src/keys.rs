//! Logical names for every key the engine persists
//!
//! One flat namespace shared by both storage scopes. The `reserva_` prefix
//! keeps the keys from colliding with anything else the host application
//! stores in the same areas.

/// Access token for API calls
pub const ACCESS_TOKEN: &str = "reserva_access_token";

/// Refresh token used to obtain a new access token
pub const REFRESH_TOKEN: &str = "reserva_refresh_token";

/// Access-token expiry, epoch milliseconds as a decimal string
pub const TOKEN_EXPIRY: &str = "reserva_token_expiry";

/// Full user profile, serialized JSON
pub const USER_PROFILE: &str = "reserva_user_profile";

/// Shadow copy of the profile id, stored independently of the full record
pub const USER_ID: &str = "reserva_user_id";

/// Shadow copy of the profile role, stored independently of the full record
pub const USER_ROLE: &str = "reserva_user_role";

/// Remember-me preference; always lives in the persistent scope
pub const REMEMBER_ME: &str = "reserva_remember_me";

/// Timestamp of the last successful login, epoch milliseconds
pub const LAST_LOGIN: &str = "reserva_last_login";

/// Scalar keys mirrored verbatim across scopes by the sync pass.
/// The full profile is deliberately absent: it is merged by score, not
/// copied blindly. The last-login timestamp is informational and stays in
/// the persistent scope.
pub const CRITICAL_KEYS: &[&str] = &[
    ACCESS_TOKEN,
    REFRESH_TOKEN,
    TOKEN_EXPIRY,
    USER_ID,
    USER_ROLE,
    REMEMBER_ME,
];
