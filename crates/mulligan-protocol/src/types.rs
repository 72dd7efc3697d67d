//! The message catalog: every type that travels on the wire.
//!
//! Each message is a fixed 4-byte header (`[kind: u16 LE][length: u16 LE]`)
//! followed by `length` bytes of JSON — the serialized payload record for
//! that kind. The records in this module define those payload shapes; the
//! [`Message`] sum type at the bottom ties each [`MessageKind`] code to its
//! record.
//!
//! Payload records are immutable value types once constructed: the codec
//! derives the header's length field at encode time, and nothing here is
//! mutated after decode.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's stable identity string.
///
/// A newtype wrapper so a player identity can't be confused with a lobby id
/// or a display name in a signature. `#[serde(transparent)]` keeps the wire
/// form a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the identity as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A lobby's generated unique id.
///
/// Same newtype pattern as [`PlayerId`]. Lobby ids are minted by the lobby
/// registry (hyphenated lowercase hex); clients only ever echo them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub String);

impl LobbyId {
    /// Returns the id as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LobbyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Card data (opaque pass-through to the game-rules engine)
// ---------------------------------------------------------------------------

/// One card as it appears inside packet payloads.
///
/// The protocol layer treats cards as opaque data: they are produced by the
/// card catalog / game-rules collaborator and carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Catalog identity of the card.
    pub id: String,
    /// Card number within its expansion.
    pub number: u32,
    /// Expansion the card belongs to.
    pub expansion: u32,
}

/// Selects one of a player's card piles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PileKind {
    Draw,
    Hand,
    Discard,
    Archive,
}

impl fmt::Display for PileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draw => write!(f, "draw"),
            Self::Hand => write!(f, "hand"),
            Self::Discard => write!(f, "discard"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload records
// ---------------------------------------------------------------------------

/// Server → client: a human-readable failure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub message: String,
}

/// Protocol version announcement (request) or confirmation (response).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: u32,
}

/// Client → server: a login attempt.
///
/// The token is validated against the external profile store; the claimed
/// `id` must match the identity the token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub token: String,
    pub id: PlayerId,
    pub name: String,
}

/// Server → client: login accepted, echoing the registered identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAck {
    pub id: PlayerId,
    pub name: String,
}

/// One row of a player-list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
}

/// Server → client: the connected-player roster, in login order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerList {
    pub count: u32,
    pub players: Vec<PlayerEntry>,
}

/// One row of a lobby-list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyEntry {
    pub id: LobbyId,
    pub name: String,
}

/// Server → client: all current lobbies, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyList {
    pub count: u32,
    pub lobbies: Vec<LobbyEntry>,
}

/// Client → server: create a lobby with this display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyName {
    pub name: String,
}

/// Server → client: the id generated for a freshly created lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyCreated {
    pub id: LobbyId,
}

/// Client → server: which lobby a join/leave request targets.
///
/// Either field may be present; the server resolves by id first, then by
/// name. Absent fields are omitted from the JSON entirely, not null-padded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LobbyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Server → client: the outcome of a lobby membership change, broadcast to
/// every current member of the affected lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyUpdate {
    pub id: LobbyId,
    pub name: String,
    pub success: bool,
}

/// Client → server: the member a host wants removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickTarget {
    pub target: PlayerId,
}

/// Server → client: the outcome of a kick, sent to kicker and kicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickOutcome {
    pub target: PlayerId,
    pub success: bool,
}

/// Client → server: a chat message body (global or lobby scope, per kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatText {
    pub message: String,
}

/// Server → client: a delivered chat line with the sender's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub name: String,
    pub message: String,
}

/// Client → server: which pile a card operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PileSelector {
    pub pile: PileKind,
}

/// Server → client: the contents of one pile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PileContents {
    pub pile: PileKind,
    pub cards: Vec<Card>,
}

/// Client → server: the card id a play/discard request acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardChoice {
    pub card: String,
}

/// Server → client: the resulting card data of a draw/play/discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardResult {
    pub card: Card,
}

// ---------------------------------------------------------------------------
// MessageKind — the numeric discriminators
// ---------------------------------------------------------------------------

/// Numeric discriminator selecting which payload shape follows the header.
///
/// The codes are wire-stable: they are what actually travels in the first
/// two header bytes, so reordering or renumbering variants is a breaking
/// protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageKind {
    Exit = 0,
    Error = 1,
    VersionRequest = 2,
    VersionResponse = 3,
    LoginRequest = 4,
    LoginResponse = 5,
    PlayerListRequest = 6,
    PlayerListResponse = 7,
    CreateLobbyRequest = 8,
    CreateLobbyResponse = 9,
    JoinLobbyRequest = 10,
    JoinLobbyResponse = 11,
    LeaveLobbyRequest = 12,
    LeaveLobbyResponse = 13,
    LobbyKickRequest = 14,
    LobbyKickResponse = 15,
    GlobalChatRequest = 16,
    GlobalChatResponse = 17,
    LobbyChatRequest = 18,
    LobbyChatResponse = 19,
    LobbyListRequest = 20,
    LobbyListResponse = 21,
    CardPileRequest = 22,
    CardPileResponse = 23,
    DrawCardRequest = 24,
    DrawCardResponse = 25,
    PlayCardRequest = 26,
    PlayCardResponse = 27,
    DiscardCardRequest = 28,
    DiscardCardResponse = 29,
}

impl MessageKind {
    /// Returns the wire code for this kind.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Looks up a kind by its wire code.
    ///
    /// Returns `None` for codes outside the catalog — the codec turns that
    /// into [`ProtocolError::UnknownKind`](crate::ProtocolError::UnknownKind),
    /// which is fatal for the connection.
    pub fn from_code(code: u16) -> Option<Self> {
        let kind = match code {
            0 => Self::Exit,
            1 => Self::Error,
            2 => Self::VersionRequest,
            3 => Self::VersionResponse,
            4 => Self::LoginRequest,
            5 => Self::LoginResponse,
            6 => Self::PlayerListRequest,
            7 => Self::PlayerListResponse,
            8 => Self::CreateLobbyRequest,
            9 => Self::CreateLobbyResponse,
            10 => Self::JoinLobbyRequest,
            11 => Self::JoinLobbyResponse,
            12 => Self::LeaveLobbyRequest,
            13 => Self::LeaveLobbyResponse,
            14 => Self::LobbyKickRequest,
            15 => Self::LobbyKickResponse,
            16 => Self::GlobalChatRequest,
            17 => Self::GlobalChatResponse,
            18 => Self::LobbyChatRequest,
            19 => Self::LobbyChatResponse,
            20 => Self::LobbyListRequest,
            21 => Self::LobbyListResponse,
            22 => Self::CardPileRequest,
            23 => Self::CardPileResponse,
            24 => Self::DrawCardRequest,
            25 => Self::DrawCardResponse,
            26 => Self::PlayCardRequest,
            27 => Self::PlayCardResponse,
            28 => Self::DiscardCardRequest,
            29 => Self::DiscardCardResponse,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ---------------------------------------------------------------------------
// Message — the sum type over the catalog
// ---------------------------------------------------------------------------

/// A decoded wire message: one variant per [`MessageKind`].
///
/// Kinds with no payload fields (`Exit`, the bare list requests) carry no
/// record; everything else wraps the payload record that defines its JSON
/// shape. The codec dispatches on [`Message::kind`] when encoding and on
/// the header code when decoding, so the two stay in lockstep by
/// construction — adding a variant without wiring it into the codec is a
/// compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Exit,
    Error(ErrorNotice),
    VersionRequest(VersionInfo),
    VersionResponse(VersionInfo),
    LoginRequest(LoginCredentials),
    LoginResponse(LoginAck),
    PlayerListRequest,
    PlayerListResponse(PlayerList),
    CreateLobbyRequest(LobbyName),
    CreateLobbyResponse(LobbyCreated),
    JoinLobbyRequest(LobbySelector),
    JoinLobbyResponse(LobbyUpdate),
    LeaveLobbyRequest(LobbySelector),
    LeaveLobbyResponse(LobbyUpdate),
    LobbyKickRequest(KickTarget),
    LobbyKickResponse(KickOutcome),
    GlobalChatRequest(ChatText),
    GlobalChatResponse(ChatLine),
    LobbyChatRequest(ChatText),
    LobbyChatResponse(ChatLine),
    LobbyListRequest,
    LobbyListResponse(LobbyList),
    CardPileRequest(PileSelector),
    CardPileResponse(PileContents),
    DrawCardRequest(PileSelector),
    DrawCardResponse(CardResult),
    PlayCardRequest(CardChoice),
    PlayCardResponse(CardResult),
    DiscardCardRequest(CardChoice),
    DiscardCardResponse(CardResult),
}

impl Message {
    /// Returns the catalog kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Exit => MessageKind::Exit,
            Self::Error(_) => MessageKind::Error,
            Self::VersionRequest(_) => MessageKind::VersionRequest,
            Self::VersionResponse(_) => MessageKind::VersionResponse,
            Self::LoginRequest(_) => MessageKind::LoginRequest,
            Self::LoginResponse(_) => MessageKind::LoginResponse,
            Self::PlayerListRequest => MessageKind::PlayerListRequest,
            Self::PlayerListResponse(_) => MessageKind::PlayerListResponse,
            Self::CreateLobbyRequest(_) => MessageKind::CreateLobbyRequest,
            Self::CreateLobbyResponse(_) => {
                MessageKind::CreateLobbyResponse
            }
            Self::JoinLobbyRequest(_) => MessageKind::JoinLobbyRequest,
            Self::JoinLobbyResponse(_) => MessageKind::JoinLobbyResponse,
            Self::LeaveLobbyRequest(_) => MessageKind::LeaveLobbyRequest,
            Self::LeaveLobbyResponse(_) => MessageKind::LeaveLobbyResponse,
            Self::LobbyKickRequest(_) => MessageKind::LobbyKickRequest,
            Self::LobbyKickResponse(_) => MessageKind::LobbyKickResponse,
            Self::GlobalChatRequest(_) => MessageKind::GlobalChatRequest,
            Self::GlobalChatResponse(_) => MessageKind::GlobalChatResponse,
            Self::LobbyChatRequest(_) => MessageKind::LobbyChatRequest,
            Self::LobbyChatResponse(_) => MessageKind::LobbyChatResponse,
            Self::LobbyListRequest => MessageKind::LobbyListRequest,
            Self::LobbyListResponse(_) => MessageKind::LobbyListResponse,
            Self::CardPileRequest(_) => MessageKind::CardPileRequest,
            Self::CardPileResponse(_) => MessageKind::CardPileResponse,
            Self::DrawCardRequest(_) => MessageKind::DrawCardRequest,
            Self::DrawCardResponse(_) => MessageKind::DrawCardResponse,
            Self::PlayCardRequest(_) => MessageKind::PlayCardRequest,
            Self::PlayCardResponse(_) => MessageKind::PlayCardResponse,
            Self::DiscardCardRequest(_) => MessageKind::DiscardCardRequest,
            Self::DiscardCardResponse(_) => {
                MessageKind::DiscardCardResponse
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
