//! Error types for the lobby layer.

use mulligan_protocol::{LobbyId, PlayerId};

/// Errors that can occur during lobby operations.
///
/// All of these are validation failures: they are reported to the acting
/// client as a wire error (or a `success: false` response) and never tear
/// the connection down.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// No lobby has the given id.
    #[error("no lobby found with id {0}")]
    NotFound(LobbyId),

    /// No lobby has the given display name.
    #[error("no lobby found with name {0:?}")]
    NameNotFound(String),

    /// Both seats are taken.
    #[error("lobby {0} is full")]
    LobbyFull(LobbyId),

    /// The player is already seated (in the named lobby).
    #[error("player {0} is already in lobby {1}")]
    AlreadyInLobby(PlayerId, LobbyId),

    /// The player isn't seated anywhere.
    #[error("player {0} is not in a lobby")]
    NotInAnyLobby(PlayerId),

    /// Only the current host may moderate the lobby.
    #[error("player {0} is not the lobby host")]
    NotHost(PlayerId),

    /// Hosts leave with a leave request, not by kicking themselves.
    #[error("player {0} cannot kick themselves")]
    CannotKickSelf(PlayerId),

    /// The kick target isn't seated in the acting player's lobby.
    #[error("player {0} is not in lobby {1}")]
    TargetNotInLobby(PlayerId, LobbyId),
}
