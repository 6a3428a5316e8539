//! Session engine errors
//!
//! Every storage and parse step inside the engine reports one of these
//! kinds. None of them cross the public facade: a failed write degrades to
//! a no-op, corrupt data is discarded, and an invalid token reads as
//! absent. The worst externally visible symptom is a `false` validity
//! answer.

use thiserror::Error;

/// Result type used by the storage contract and engine internals
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failure kinds the engine absorbs locally
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The underlying medium rejected a write (quota, privacy mode)
    #[error("storage rejected write for key '{key}'")]
    StorageUnavailable { key: String },

    /// A stored value failed to parse or lacks required fields
    #[error("stored value for key '{key}' is corrupt")]
    CorruptData { key: String },

    /// A token read back as a null-like sentinel value
    #[error("token value is a null-like sentinel")]
    InvalidToken,
}
