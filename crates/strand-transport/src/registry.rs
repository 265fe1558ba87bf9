//! Process-wide session registry.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use strand_core::SessionId;

use crate::connection::ConnectionHandle;
use crate::errors::RegistryError;

/// Maps session identifiers to live connection handles.
///
/// The registry is the only process-wide mutable state in the transport.
/// It is constructed once and injected into the endpoints that need it —
/// never reached through ambient globals. All operations are in-memory
/// and take one short critical section; no I/O and no application
/// callbacks ever run under the lock.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<ConnectionHandle>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a handle under its session ID.
    ///
    /// Fails with [`RegistryError::DuplicateSession`] if an entry already
    /// exists — with randomly minted IDs that is an internal invariant
    /// violation, and the caller must abandon this stream-open attempt.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> Result<(), RegistryError> {
        let id = handle.session_id().clone();
        let mut sessions = self.sessions.write();
        match sessions.entry(id) {
            Entry::Occupied(occupied) => {
                warn!(session_id = %occupied.key(), "session id collision on register");
                Err(RegistryError::DuplicateSession(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                debug!(session_id = %vacant.key(), "session registered");
                let _ = vacant.insert(handle);
                Ok(())
            }
        }
    }

    /// Resolve a session ID to its live handle.
    ///
    /// Pure read; an absent entry is a defined outcome, not an error.
    pub fn lookup(&self, id: &SessionId) -> Option<Arc<ConnectionHandle>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session's entry.
    ///
    /// Idempotent: removing an id with no entry is a no-op, which guards
    /// against double-cleanup races between disconnect paths.
    pub fn remove(&self, id: &SessionId) {
        if self.sessions.write().remove(id).is_some() {
            debug!(session_id = %id, "session removed");
        }
    }

    /// Whether an entry exists for the session ID.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drain every entry and close each handle.
    ///
    /// Handles are closed after the lock is released: close callbacks may
    /// re-enter the registry (removal is idempotent, so that is safe).
    pub fn close_all(&self) {
        let drained: Vec<Arc<ConnectionHandle>> = {
            let mut sessions = self.sessions.write();
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        for handle in drained {
            handle.close();
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
