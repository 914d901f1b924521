//! Registry of live intake sessions keyed by connection.
//!
//! The only state shared between connection loops. Each loop touches only
//! its own entry; the map lock is never held across an await on anything
//! other than the map itself.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::ConnectionId;
use crate::domain::intake::IntakeSession;

/// Shared handle to one connection's session.
pub type SessionHandle = Arc<Mutex<IntakeSession>>;

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A session is already open for connection {0}")]
    AlreadyOpen(ConnectionId),
}

/// Manages the live sessions, one per connection.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConnectionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a fresh session for the connection.
    ///
    /// # Errors
    ///
    /// `AlreadyOpen` if the connection already has a session. The existing
    /// session is left untouched.
    pub async fn open(&self, connection_id: ConnectionId) -> Result<SessionHandle, RegistryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&connection_id) {
            return Err(RegistryError::AlreadyOpen(connection_id));
        }

        let session = Arc::new(Mutex::new(IntakeSession::new(connection_id)));
        sessions.insert(connection_id, Arc::clone(&session));
        Ok(session)
    }

    /// Looks up the session for a connection.
    ///
    /// The connection loop holds the session lock while it processes one
    /// inbound message (including the extraction call), so `lock()` on the
    /// returned handle may wait for that message to finish.
    pub async fn get(&self, connection_id: &ConnectionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(connection_id).cloned()
    }

    /// Removes the connection's entry. Removing an absent entry is a no-op.
    pub async fn close(&self, connection_id: &ConnectionId) -> bool {
        self.sessions.write().await.remove(connection_id).is_some()
    }

    /// Number of open sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
