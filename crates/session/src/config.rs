//! Engine configuration following 12-factor app principles
//!
//! Every knob has a compiled default so the engine also constructs without
//! any environment. Overrides are read from environment variables, with a
//! `.env` file honored in development.

use anyhow::Result;
use std::env;

use crate::expiry;

/// Tunable policy knobs for the session engine
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Safety margin applied to token expiry checks
    pub token_expiry_buffer_ms: i64,

    /// Sliding recent-login window for grace-period decisions
    pub login_grace_window_ms: i64,

    /// Age past which cached profile data earns no recency bonus
    pub profile_recency_horizon_ms: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_expiry_buffer_ms: expiry::TOKEN_EXPIRY_BUFFER_MS,
            login_grace_window_ms: expiry::LOGIN_GRACE_WINDOW_MS,
            profile_recency_horizon_ms: expiry::PROFILE_RECENCY_HORIZON_MS,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            token_expiry_buffer_ms: env_ms(
                "SESSION_TOKEN_EXPIRY_BUFFER_MS",
                expiry::TOKEN_EXPIRY_BUFFER_MS,
            )?,
            login_grace_window_ms: env_ms(
                "SESSION_LOGIN_GRACE_WINDOW_MS",
                expiry::LOGIN_GRACE_WINDOW_MS,
            )?,
            profile_recency_horizon_ms: env_ms(
                "SESSION_PROFILE_RECENCY_HORIZON_MS",
                expiry::PROFILE_RECENCY_HORIZON_MS,
            )?,
        };

        if config.login_grace_window_ms <= 0 {
            anyhow::bail!("SESSION_LOGIN_GRACE_WINDOW_MS must be positive");
        }
        if config.profile_recency_horizon_ms <= 0 {
            anyhow::bail!("SESSION_PROFILE_RECENCY_HORIZON_MS must be positive");
        }
        if config.token_expiry_buffer_ms < 0 {
            anyhow::bail!("SESSION_TOKEN_EXPIRY_BUFFER_MS must not be negative");
        }

        Ok(config)
    }
}

fn env_ms(name: &str, default: i64) -> Result<i64> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} must be an integer millisecond value")),
        Err(_) => Ok(default),
    }
}
