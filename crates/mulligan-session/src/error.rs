//! Error types for the session layer.

use mulligan_protocol::PlayerId;
use mulligan_transport::ConnectionId;

/// Errors that can occur during login validation and roster lookups.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential token was rejected by the profile store.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The token resolved to a different identity than the client claimed.
    /// Always fatal for the connection.
    #[error("claimed identity {claimed} does not match profile {resolved}")]
    IdentityMismatch {
        claimed: PlayerId,
        resolved: PlayerId,
    },

    /// No connected player has the given identity.
    #[error("no session found for player {0}")]
    NotFound(PlayerId),

    /// The connection has not completed a login handshake.
    #[error("no session registered on {0}")]
    NoSessionOnConnection(ConnectionId),
}
