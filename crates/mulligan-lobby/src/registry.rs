//! Lobby registry: creates, tracks, and mutates lobbies.
//!
//! Like the session registry, this structure is not thread-safe by itself;
//! the server serializes access behind one `tokio::sync::Mutex`, which
//! makes every operation here atomic with respect to every other
//! connection's handler.

use std::collections::HashMap;

use mulligan_protocol::{LobbyId, PlayerId};
use rand::Rng;

use crate::{Lobby, LobbyError};

/// Manages all current lobbies and tracks which player sits where.
///
/// The member index enforces the "one lobby at a time" invariant; the
/// creation-order list backs the ordered lobby-list response.
#[derive(Default)]
pub struct LobbyRegistry {
    /// Current lobbies, keyed by lobby id.
    lobbies: HashMap<LobbyId, Lobby>,

    /// Maps each seated player to their lobby.
    member_index: HashMap<PlayerId, LobbyId>,

    /// Lobby ids in creation order, for list ordering.
    order: Vec<LobbyId>,
}

/// What a leave (or host self-kick) changed, for the caller's broadcasts.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// Id of the lobby that was left.
    pub lobby_id: LobbyId,
    /// Display name of that lobby.
    pub lobby_name: String,
    /// Players still seated after the departure, in join order.
    pub remaining: Vec<PlayerId>,
    /// The lobby was emptied and has been removed from the registry.
    pub removed_lobby: bool,
    /// The member promoted to host, when the departing player hosted.
    pub promoted_host: Option<PlayerId>,
}

impl LobbyRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a lobby with the given display name, seating the creator
    /// as sole member and host, and returns it.
    ///
    /// # Errors
    /// Returns [`LobbyError::AlreadyInLobby`] if the creator is already
    /// seated somewhere.
    pub fn create(
        &mut self,
        creator: PlayerId,
        name: &str,
    ) -> Result<&Lobby, LobbyError> {
        if let Some(current) = self.member_index.get(&creator) {
            return Err(LobbyError::AlreadyInLobby(
                creator,
                current.clone(),
            ));
        }

        let id = generate_lobby_id();
        let lobby = Lobby::new(id.clone(), name.to_string(), creator.clone());

        self.member_index.insert(creator, id.clone());
        self.order.push(id.clone());
        self.lobbies.insert(id.clone(), lobby);

        tracing::info!(lobby_id = %id, name, "lobby created");
        Ok(self.lobbies.get(&id).expect("just inserted"))
    }

    /// Removes a lobby outright, unseating any remaining members.
    pub fn remove(&mut self, id: &LobbyId) -> Option<Lobby> {
        let lobby = self.lobbies.remove(id)?;
        for member in lobby.members() {
            self.member_index.remove(member);
        }
        self.order.retain(|lid| lid != id);
        tracing::info!(lobby_id = %id, "lobby removed");
        Some(lobby)
    }

    /// Looks up a lobby by id.
    ///
    /// # Errors
    /// Returns [`LobbyError::NotFound`] if no such lobby exists.
    pub fn find(&self, id: &LobbyId) -> Result<&Lobby, LobbyError> {
        self.lobbies
            .get(id)
            .ok_or_else(|| LobbyError::NotFound(id.clone()))
    }

    /// Looks up a lobby by display name (names are not unique — the
    /// earliest-created match wins, same as the original service).
    ///
    /// # Errors
    /// Returns [`LobbyError::NameNotFound`] if no lobby has this name.
    pub fn find_by_name(&self, name: &str) -> Result<&Lobby, LobbyError> {
        self.order
            .iter()
            .filter_map(|id| self.lobbies.get(id))
            .find(|lobby| lobby.name() == name)
            .ok_or_else(|| LobbyError::NameNotFound(name.to_string()))
    }

    /// Returns the lobby the player currently sits in.
    ///
    /// # Errors
    /// Returns [`LobbyError::NotInAnyLobby`] if the player is unseated.
    pub fn find_by_member(
        &self,
        player: &PlayerId,
    ) -> Result<&Lobby, LobbyError> {
        let id = self
            .member_index
            .get(player)
            .ok_or_else(|| LobbyError::NotInAnyLobby(player.clone()))?;
        self.lobbies
            .get(id)
            .ok_or_else(|| LobbyError::NotFound(id.clone()))
    }

    /// Snapshot of all lobbies, in creation order.
    pub fn list(&self) -> Vec<&Lobby> {
        self.order
            .iter()
            .filter_map(|id| self.lobbies.get(id))
            .collect()
    }

    /// Seats a player in the lobby with the given id.
    ///
    /// Returns the lobby after the join so the caller can broadcast to
    /// every current member (the newcomer included).
    ///
    /// # Errors
    /// - [`LobbyError::AlreadyInLobby`] if the player is seated anywhere.
    /// - [`LobbyError::NotFound`] if the lobby doesn't exist.
    /// - [`LobbyError::LobbyFull`] if both seats are taken; membership is
    ///   left unchanged.
    pub fn join(
        &mut self,
        id: &LobbyId,
        player: PlayerId,
    ) -> Result<&Lobby, LobbyError> {
        if let Some(current) = self.member_index.get(&player) {
            return Err(LobbyError::AlreadyInLobby(
                player,
                current.clone(),
            ));
        }

        let lobby = self
            .lobbies
            .get_mut(id)
            .ok_or_else(|| LobbyError::NotFound(id.clone()))?;
        if lobby.is_full() {
            return Err(LobbyError::LobbyFull(id.clone()));
        }

        lobby.seat(player.clone());
        self.member_index.insert(player.clone(), id.clone());

        tracing::info!(lobby_id = %id, player_id = %player, "player joined lobby");
        Ok(self.lobbies.get(id).expect("just mutated"))
    }

    /// Removes a player from their current lobby.
    ///
    /// When the departing player hosted, the earliest remaining member is
    /// promoted; when they were the last member, the lobby itself is
    /// removed. Both facts are reported in the [`LeaveOutcome`].
    ///
    /// # Errors
    /// Returns [`LobbyError::NotInAnyLobby`] if the player is unseated.
    pub fn leave(
        &mut self,
        player: &PlayerId,
    ) -> Result<LeaveOutcome, LobbyError> {
        let id = self
            .member_index
            .remove(player)
            .ok_or_else(|| LobbyError::NotInAnyLobby(player.clone()))?;

        let lobby = self
            .lobbies
            .get_mut(&id)
            .ok_or_else(|| LobbyError::NotFound(id.clone()))?;

        let promoted_host = lobby.unseat(player);
        let lobby_name = lobby.name().to_string();
        let remaining = lobby.members().to_vec();
        let removed_lobby = lobby.is_empty();

        if removed_lobby {
            self.lobbies.remove(&id);
            self.order.retain(|lid| lid != &id);
            tracing::info!(lobby_id = %id, "last player left, lobby removed");
        } else if let Some(host) = &promoted_host {
            tracing::info!(lobby_id = %id, new_host = %host, "host left, promoted next member");
        }

        Ok(LeaveOutcome {
            lobby_id: id,
            lobby_name,
            remaining,
            removed_lobby,
            promoted_host,
        })
    }

    /// Removes `target` from the lobby `acting` hosts.
    ///
    /// Host privilege is re-validated here on every attempt — the caller
    /// never caches it. Returns the lobby after the removal.
    ///
    /// # Errors
    /// - [`LobbyError::NotInAnyLobby`] if `acting` is unseated.
    /// - [`LobbyError::NotHost`] if `acting` doesn't host their lobby;
    ///   membership is left unchanged.
    /// - [`LobbyError::CannotKickSelf`] if `acting == target`.
    /// - [`LobbyError::TargetNotInLobby`] if `target` isn't seated there.
    pub fn kick(
        &mut self,
        acting: &PlayerId,
        target: &PlayerId,
    ) -> Result<&Lobby, LobbyError> {
        let id = self
            .member_index
            .get(acting)
            .cloned()
            .ok_or_else(|| LobbyError::NotInAnyLobby(acting.clone()))?;

        let lobby = self
            .lobbies
            .get_mut(&id)
            .ok_or_else(|| LobbyError::NotFound(id.clone()))?;

        if lobby.host() != acting {
            return Err(LobbyError::NotHost(acting.clone()));
        }
        if acting == target {
            return Err(LobbyError::CannotKickSelf(acting.clone()));
        }
        if !lobby.contains(target) {
            return Err(LobbyError::TargetNotInLobby(
                target.clone(),
                id.clone(),
            ));
        }

        lobby.unseat(target);
        self.member_index.remove(target);

        tracing::info!(lobby_id = %id, target = %target, "player kicked from lobby");
        Ok(self.lobbies.get(&id).expect("just mutated"))
    }

    /// Returns the number of current lobbies.
    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    /// Returns `true` if there are no lobbies.
    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}

/// Generates a fresh 36-character hyphenated lowercase-hex lobby id.
fn generate_lobby_id() -> LobbyId {
    const CHOICES: &[u8] = b"abcdef0123456789";
    let mut rng = rand::rng();
    let id: String = (0..36)
        .map(|i| {
            if matches!(i, 8 | 13 | 18 | 23) {
                '-'
            } else {
                CHOICES[rng.random_range(0..CHOICES.len())] as char
            }
        })
        .collect();
    LobbyId(id)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    /// Creates a registry with one lobby hosted by `u1`, returning its id.
    fn registry_with_lobby() -> (LobbyRegistry, LobbyId) {
        let mut registry = LobbyRegistry::new();
        let id = registry
            .create(pid("u1"), "casual")
            .expect("create")
            .id()
            .clone();
        (registry, id)
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[test]
    fn test_create_seats_creator_as_host_and_sole_member() {
        let (registry, id) = registry_with_lobby();

        let lobby = registry.find(&id).expect("should exist");
        assert_eq!(lobby.host(), &pid("u1"));
        assert_eq!(lobby.members(), &[pid("u1")]);
        assert_eq!(lobby.name(), "casual");
    }

    #[test]
    fn test_create_generates_unique_hyphenated_ids() {
        let mut registry = LobbyRegistry::new();
        let a = registry.create(pid("u1"), "a").unwrap().id().clone();
        let b = registry.create(pid("u2"), "b").unwrap().id().clone();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
        for i in [8, 13, 18, 23] {
            assert_eq!(a.as_str().as_bytes()[i], b'-');
        }
    }

    #[test]
    fn test_create_while_seated_elsewhere_fails() {
        let (mut registry, _id) = registry_with_lobby();

        let result = registry.create(pid("u1"), "second");

        assert!(matches!(
            result,
            Err(LobbyError::AlreadyInLobby(p, _)) if p == pid("u1")
        ));
        assert_eq!(registry.len(), 1);
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_appends_in_join_order() {
        let (mut registry, id) = registry_with_lobby();

        let lobby = registry.join(&id, pid("u2")).expect("join");

        assert_eq!(lobby.members(), &[pid("u1"), pid("u2")]);
        assert_eq!(lobby.host(), &pid("u1"));
    }

    #[test]
    fn test_third_join_fails_and_leaves_membership_unchanged() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).expect("second seat");

        let result = registry.join(&id, pid("u3"));

        assert!(matches!(
            result,
            Err(LobbyError::LobbyFull(ref full)) if full == &id
        ));
        let lobby = registry.find(&id).unwrap();
        assert_eq!(lobby.members(), &[pid("u1"), pid("u2")]);
        // The rejected player is free to join elsewhere.
        assert!(registry.find_by_member(&pid("u3")).is_err());
    }

    #[test]
    fn test_join_unknown_lobby_fails() {
        let mut registry = LobbyRegistry::new();

        let result = registry.join(&LobbyId::from("ghost"), pid("u1"));

        assert!(matches!(result, Err(LobbyError::NotFound(_))));
    }

    #[test]
    fn test_join_while_seated_elsewhere_fails() {
        let (mut registry, _first) = registry_with_lobby();
        let second = registry
            .create(pid("u2"), "other")
            .unwrap()
            .id()
            .clone();

        let result = registry.join(&second, pid("u1"));

        assert!(matches!(result, Err(LobbyError::AlreadyInLobby(..))));
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_reports_remaining_members() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();

        let outcome = registry.leave(&pid("u2")).expect("leave");

        assert_eq!(outcome.lobby_id, id);
        assert_eq!(outcome.remaining, vec![pid("u1")]);
        assert!(!outcome.removed_lobby);
        assert_eq!(outcome.promoted_host, None);
    }

    #[test]
    fn test_host_leave_promotes_earliest_remaining_member() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();

        let outcome = registry.leave(&pid("u1")).expect("host leaves");

        assert_eq!(outcome.promoted_host, Some(pid("u2")));
        let lobby = registry.find(&id).unwrap();
        assert_eq!(lobby.host(), &pid("u2"));
        assert!(lobby.contains(lobby.host()), "host must stay a member");
    }

    #[test]
    fn test_last_leave_removes_the_lobby() {
        let (mut registry, id) = registry_with_lobby();

        let outcome = registry.leave(&pid("u1")).expect("leave");

        assert!(outcome.removed_lobby);
        assert!(registry.is_empty());
        assert!(registry.find(&id).is_err());
    }

    #[test]
    fn test_leave_when_unseated_fails() {
        let mut registry = LobbyRegistry::new();

        let result = registry.leave(&pid("u1"));

        assert!(matches!(result, Err(LobbyError::NotInAnyLobby(_))));
    }

    #[test]
    fn test_leave_frees_the_seat_for_rejoining() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();
        registry.leave(&pid("u2")).unwrap();

        // Seat is free again.
        let lobby = registry.join(&id, pid("u3")).expect("rejoin");
        assert_eq!(lobby.members(), &[pid("u1"), pid("u3")]);
    }

    // =====================================================================
    // kick()
    // =====================================================================

    #[test]
    fn test_kick_by_host_removes_target() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();

        let lobby = registry.kick(&pid("u1"), &pid("u2")).expect("kick");

        assert_eq!(lobby.members(), &[pid("u1")]);
        assert!(registry.find_by_member(&pid("u2")).is_err());
    }

    #[test]
    fn test_kick_by_non_host_fails_and_membership_unchanged() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();

        let result = registry.kick(&pid("u2"), &pid("u1"));

        assert!(matches!(
            result,
            Err(LobbyError::NotHost(p)) if p == pid("u2")
        ));
        let lobby = registry.find(&id).unwrap();
        assert_eq!(lobby.members(), &[pid("u1"), pid("u2")]);
    }

    #[test]
    fn test_host_privilege_is_revalidated_after_promotion() {
        // u1 hosts, u2 joins, u1 leaves → u2 hosts. The old host's
        // privilege must not survive the departure.
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();
        registry.leave(&pid("u1")).unwrap();
        registry.join(&id, pid("u1")).unwrap();

        let result = registry.kick(&pid("u1"), &pid("u2"));
        assert!(matches!(result, Err(LobbyError::NotHost(_))));

        let lobby = registry.kick(&pid("u2"), &pid("u1")).expect("new host");
        assert_eq!(lobby.members(), &[pid("u2")]);
    }

    #[test]
    fn test_kick_self_is_rejected() {
        let (mut registry, _id) = registry_with_lobby();

        let result = registry.kick(&pid("u1"), &pid("u1"));

        assert!(matches!(result, Err(LobbyError::CannotKickSelf(_))));
    }

    #[test]
    fn test_kick_target_in_another_lobby_fails() {
        let (mut registry, _id) = registry_with_lobby();
        registry.create(pid("u2"), "other").unwrap();

        let result = registry.kick(&pid("u1"), &pid("u2"));

        assert!(matches!(
            result,
            Err(LobbyError::TargetNotInLobby(..))
        ));
    }

    // =====================================================================
    // Lookups and listing
    // =====================================================================

    #[test]
    fn test_find_by_name_prefers_earliest_created() {
        let mut registry = LobbyRegistry::new();
        let first = registry.create(pid("u1"), "dup").unwrap().id().clone();
        registry.create(pid("u2"), "dup").unwrap();

        let found = registry.find_by_name("dup").expect("should find");
        assert_eq!(found.id(), &first);
    }

    #[test]
    fn test_find_by_name_unknown_fails() {
        let registry = LobbyRegistry::new();
        assert!(matches!(
            registry.find_by_name("ghost"),
            Err(LobbyError::NameNotFound(_))
        ));
    }

    #[test]
    fn test_find_by_member_resolves_current_lobby() {
        let (registry, id) = registry_with_lobby();

        let lobby = registry.find_by_member(&pid("u1")).expect("seated");
        assert_eq!(lobby.id(), &id);
    }

    #[test]
    fn test_list_preserves_creation_order() {
        let mut registry = LobbyRegistry::new();
        registry.create(pid("u1"), "first").unwrap();
        registry.create(pid("u2"), "second").unwrap();
        registry.create(pid("u3"), "third").unwrap();

        let names: Vec<&str> =
            registry.list().iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_remove_unseats_all_members() {
        let (mut registry, id) = registry_with_lobby();
        registry.join(&id, pid("u2")).unwrap();

        let removed = registry.remove(&id).expect("should remove");

        assert_eq!(removed.members().len(), 2);
        assert!(registry.is_empty());
        assert!(registry.find_by_member(&pid("u1")).is_err());
        assert!(registry.find_by_member(&pid("u2")).is_err());
    }
}
