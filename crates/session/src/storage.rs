//! Dual-scope key/value storage primitives
//!
//! The engine never touches a physical store directly. It is handed one
//! [`StorageArea`] per scope and addresses them through a [`ScopePair`],
//! which keeps every other module free of knowledge about where the bytes
//! actually live (browser storage, keychain, an in-memory map under test).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::Result;

/// The two independent storage areas the engine reconciles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Survives restarts; authoritative when "remember me" is enabled
    Persistent,
    /// Cleared when the page session ends
    Session,
}

impl Scope {
    /// The opposite scope
    pub fn other(&self) -> Scope {
        match self {
            Scope::Persistent => Scope::Session,
            Scope::Session => Scope::Persistent,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Persistent => write!(f, "persistent"),
            Scope::Session => write!(f, "session"),
        }
    }
}

/// One physical key/value area.
///
/// `get` must not fail on a missing key. `set` may fail when the medium
/// rejects the write (quota exhaustion, privacy mode); callers treat any
/// such failure as a no-op, never as fatal.
pub trait StorageArea: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// In-memory storage area.
///
/// The default implementation for tests and native hosts. Cloning shares
/// the underlying map, so a test can keep a handle to seed or inspect the
/// same entries the engine sees.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the current entries, for test assertions
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned mutex only means a writer panicked mid-operation; the
        // map itself is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// The pair of storage areas the engine operates on.
///
/// Cheap to clone: each store holds its own handle, the same way the
/// repository layer clones a connection pool.
#[derive(Clone)]
pub struct ScopePair {
    persistent: Arc<dyn StorageArea>,
    session: Arc<dyn StorageArea>,
}

impl ScopePair {
    pub fn new(persistent: Arc<dyn StorageArea>, session: Arc<dyn StorageArea>) -> Self {
        Self {
            persistent,
            session,
        }
    }

    fn area(&self, scope: Scope) -> &dyn StorageArea {
        match scope {
            Scope::Persistent => self.persistent.as_ref(),
            Scope::Session => self.session.as_ref(),
        }
    }

    pub fn get(&self, scope: Scope, key: &str) -> Option<String> {
        self.area(scope).get(key)
    }

    pub fn set(&self, scope: Scope, key: &str, value: &str) -> Result<()> {
        self.area(scope).set(key, value)
    }

    /// Write that degrades to a logged no-op when the medium rejects it
    pub fn set_or_log(&self, scope: Scope, key: &str, value: &str) -> bool {
        match self.set(scope, key, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%scope, key, error = %err, "storage write rejected");
                false
            }
        }
    }

    pub fn remove(&self, scope: Scope, key: &str) {
        self.area(scope).remove(key);
    }

    /// Remove a key from both scopes
    pub fn remove_everywhere(&self, key: &str) {
        self.remove(Scope::Persistent, key);
        self.remove(Scope::Session, key);
    }

    /// Scope the stored remember-me preference selects for new writes.
    ///
    /// The preference itself always lives in the persistent scope so it is
    /// legible before any token exists. Anything other than an explicit
    /// "true" falls back to the session scope.
    pub fn preferred_scope(&self) -> Scope {
        match self.get(Scope::Persistent, crate::keys::REMEMBER_ME).as_deref() {
            Some("true") => Scope::Persistent,
            _ => Scope::Session,
        }
    }
}
