//! Session types: one authenticated, connected player.

use std::sync::Mutex;

use mulligan_protocol::PlayerId;
use mulligan_transport::Connection;

// ---------------------------------------------------------------------------
// Affect
// ---------------------------------------------------------------------------

/// A transient status affect applied to a player.
///
/// Affects are attached by the game-rules collaborator (a card granting a
/// buff, a penalty lasting two turns) and carried here only so the network
/// layer can track them per session. They compare by value: the registry's
/// dedup guarantee — adding an equal affect twice stores exactly one —
/// rests on this `PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affect {
    /// Discriminator for the affect's effect, owned by the game rules.
    pub kind: u16,
    /// Remaining duration in turns. Ignored when `permanent` is set.
    pub duration: u32,
    /// A permanent affect never expires on its own.
    pub permanent: bool,
    /// Catalog id of the card that applied this affect, if any.
    pub card: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One authenticated, connected player.
///
/// The identity, display name, and transport handle are fixed at login.
/// The affect list is the session's only mutable state and sits behind the
/// session's own lock — touching one player's affects never blocks the
/// registry or any other session.
///
/// The session registry holds the authoritative `Arc<Session>`; handlers
/// only ever borrow one transiently while servicing a message.
#[derive(Debug)]
pub struct Session {
    id: PlayerId,
    name: String,
    connection: Connection,
    affects: Mutex<Vec<Affect>>,
}

impl Session {
    /// Creates a session for a player whose login handshake completed.
    pub fn new(id: PlayerId, name: String, connection: Connection) -> Self {
        Self {
            id,
            name,
            connection,
            affects: Mutex::new(Vec::new()),
        }
    }

    /// The player's stable identity.
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// The player's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The write handle of the owning connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Adds an affect. A no-op when an equal affect is already present.
    pub fn add_affect(&self, affect: Affect) {
        let mut affects = self.affects.lock().expect("affect lock poisoned");
        if !affects.contains(&affect) {
            affects.push(affect);
        }
    }

    /// Removes the affect equal to `affect`, if present.
    pub fn remove_affect(&self, affect: &Affect) {
        let mut affects = self.affects.lock().expect("affect lock poisoned");
        affects.retain(|a| a != affect);
    }

    /// Returns `true` if an equal affect is currently applied.
    pub fn has_affect(&self, affect: &Affect) -> bool {
        self.affects
            .lock()
            .expect("affect lock poisoned")
            .contains(affect)
    }

    /// Snapshot of all current affects, in application order.
    pub fn affects(&self) -> Vec<Affect> {
        self.affects.lock().expect("affect lock poisoned").clone()
    }

    /// Snapshot of the affects applied by the given card.
    pub fn affects_for_card(&self, card_id: &str) -> Vec<Affect> {
        self.affects
            .lock()
            .expect("affect lock poisoned")
            .iter()
            .filter(|a| a.card.as_deref() == Some(card_id))
            .cloned()
            .collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
