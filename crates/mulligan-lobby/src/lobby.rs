//! The lobby record itself.

use mulligan_protocol::{LobbyId, PlayerId};

/// Maximum number of seated players per lobby.
pub const MAX_SEATS: usize = 2;

/// A pending match-making group: up to two seated players and a host.
///
/// Mutation happens only inside [`LobbyRegistry`](crate::LobbyRegistry)
/// operations; the public surface here is read-only so callers can't
/// bypass the registry's invariants.
#[derive(Debug, Clone)]
pub struct Lobby {
    id: LobbyId,
    name: String,
    host: PlayerId,
    /// Seated players in join order. Never exceeds [`MAX_SEATS`].
    members: Vec<PlayerId>,
}

impl Lobby {
    pub(crate) fn new(id: LobbyId, name: String, host: PlayerId) -> Self {
        let members = vec![host.clone()];
        Self {
            id,
            name,
            host,
            members,
        }
    }

    /// The lobby's generated unique id.
    pub fn id(&self) -> &LobbyId {
        &self.id
    }

    /// The lobby's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current host. Always one of [`members`](Self::members).
    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    /// Seated players, in join order.
    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    /// Returns `true` if the player is seated in this lobby.
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.members.contains(player)
    }

    /// Returns `true` if both seats are taken.
    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_SEATS
    }

    /// Returns `true` if nobody is seated.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn seat(&mut self, player: PlayerId) {
        debug_assert!(!self.is_full() && !self.contains(&player));
        self.members.push(player);
    }

    /// Removes the player and, if they hosted, promotes the earliest
    /// remaining member. Returns the promoted host, if any.
    pub(crate) fn unseat(&mut self, player: &PlayerId) -> Option<PlayerId> {
        self.members.retain(|m| m != player);
        if &self.host == player {
            if let Some(next) = self.members.first() {
                self.host = next.clone();
                return Some(self.host.clone());
            }
        }
        None
    }
}
