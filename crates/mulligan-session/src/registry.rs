//! The session registry: the authoritative roster of connected players.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself — the server wraps the
//! whole registry in one `tokio::sync::Mutex`, and that registry-wide lock
//! serializes every structural change (add/remove) and every snapshot, so
//! a concurrent snapshot can never observe a half-appended roster. A
//! session's *own* mutable state (its affect list) is guarded by the
//! session's own lock instead, so per-player mutation never holds the
//! roster lock.

use std::collections::HashMap;
use std::sync::Arc;

use mulligan_protocol::PlayerId;
use mulligan_transport::ConnectionId;

use crate::{Session, SessionError};

/// Tracks every connected, authenticated player.
///
/// Keyed by identity, with a secondary index by transport handle (the
/// connection read loop only knows which socket a message arrived on) and
/// an explicit login-order list backing the ordered player-list response.
/// The three structures are kept in sync by the mutating operations.
#[derive(Default)]
pub struct SessionRegistry {
    /// All sessions, keyed by player identity.
    sessions: HashMap<PlayerId, Arc<Session>>,

    /// Index from transport handle to player identity.
    by_connection: HashMap<ConnectionId, PlayerId>,

    /// Identities in login order, for snapshot ordering.
    order: Vec<PlayerId>,
}

impl SessionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session to the roster.
    ///
    /// A no-op when a session with the same identity is already present —
    /// the existing session stays authoritative and the newcomer is
    /// dropped by the caller along with its connection.
    pub fn add(&mut self, session: Arc<Session>) {
        if self.sessions.contains_key(session.id()) {
            tracing::debug!(
                player_id = %session.id(),
                "session already registered, ignoring duplicate"
            );
            return;
        }

        tracing::info!(
            player_id = %session.id(),
            name = session.name(),
            "player logged in"
        );

        self.by_connection
            .insert(session.connection().id(), session.id().clone());
        self.order.push(session.id().clone());
        self.sessions.insert(session.id().clone(), session);
    }

    /// Removes the session with the given identity, if present.
    pub fn remove(&mut self, id: &PlayerId) -> Option<Arc<Session>> {
        let session = self.sessions.remove(id)?;
        self.by_connection.remove(&session.connection().id());
        self.order.retain(|pid| pid != id);
        tracing::info!(player_id = %id, "player removed from roster");
        Some(session)
    }

    /// Removes the session owning the given connection, if any.
    pub fn remove_by_connection(
        &mut self,
        connection: ConnectionId,
    ) -> Option<Arc<Session>> {
        let id = self.by_connection.get(&connection)?.clone();
        self.remove(&id)
    }

    /// Returns `true` if a session with this identity is registered.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Looks up a session by player identity.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no such player is connected.
    pub fn find_by_id(
        &self,
        id: &PlayerId,
    ) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Looks up the session that owns the given connection.
    ///
    /// # Errors
    /// Returns [`SessionError::NoSessionOnConnection`] if the connection
    /// has not completed a login handshake.
    pub fn find_by_connection(
        &self,
        connection: ConnectionId,
    ) -> Result<Arc<Session>, SessionError> {
        let id = self
            .by_connection
            .get(&connection)
            .ok_or(SessionError::NoSessionOnConnection(connection))?;
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Snapshot of every session, in login order.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id).cloned())
            .collect()
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no players are connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
