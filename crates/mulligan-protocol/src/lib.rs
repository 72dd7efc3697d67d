//! Wire protocol for Mulligan.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Message`], [`MessageKind`], the payload records) —
//!   the message catalog that travels on the wire.
//! - **Codec** ([`encode`], [`decode_payload`], [`read_message`],
//!   [`write_message`]) — the framing layer that turns messages into
//!   header-prefixed byte frames and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while framing.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the server's
//! handlers (player context). It doesn't know about connections, sessions,
//! or lobbies — it only knows how to frame and unframe messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Handlers (player context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{
    HEADER_LEN, Header, decode_payload, encode, read_message, write_message,
};
pub use error::ProtocolError;
pub use types::{
    Card, CardChoice, CardResult, ChatLine, ChatText, ErrorNotice,
    KickOutcome, KickTarget, LobbyCreated, LobbyEntry, LobbyId, LobbyList,
    LobbyName, LobbySelector, LobbyUpdate, LoginAck, LoginCredentials,
    Message, MessageKind, PileContents, PileKind, PileSelector, PlayerEntry,
    PlayerId, PlayerList, VersionInfo,
};

/// The current protocol version. A client must announce exactly this value
/// in its `VersionRequest` or the server closes the connection.
///
/// There is no negotiation or fallback: the version is a single comparable
/// value, and a mismatch is always fatal.
pub const PROTOCOL_VERSION: u32 = 1;
