//! Unified error type for the Mulligan server.

use mulligan_lobby::LobbyError;
use mulligan_protocol::ProtocolError;
use mulligan_session::SessionError;
use mulligan_transport::{ConnectionId, TransportError};

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so handlers can use `?` on any layer's result and end up here.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, close).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (framing, unknown kind, bad payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, identity, roster lookups).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A lobby-level error (capacity, membership, host privilege).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A response write exceeded the per-recipient send bound.
    #[error("send to {0} timed out")]
    SendTimedOut(ConnectionId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::other("gone"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Transport(_)));
        assert!(server_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownKind(0xBEEF);
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AuthFailed("nope".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Session(_)));
    }

    #[test]
    fn test_from_lobby_error() {
        let err = LobbyError::NameNotFound("ghost".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Lobby(_)));
    }
}
