//! Wall-clock abstraction
//!
//! Expiry and recency checks compare against an injected clock so tests
//! control "now" deterministically instead of sleeping.

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[mutants::skip] // Reads the system clock; nothing deterministic to assert
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
