//! Framing codec: message ⇄ header-prefixed byte frames.
//!
//! Every frame is a fixed 4-byte header followed by the payload:
//!
//! ```text
//! ┌──────────────┬────────────────┬──────────────────────────┐
//! │ kind: u16 LE │ length: u16 LE │ length bytes of JSON     │
//! └──────────────┴────────────────┴──────────────────────────┘
//! ```
//!
//! The header's `length` is always derived from the serialized payload at
//! encode time, never supplied by the caller. A payload that serializes to
//! more than `u16::MAX` bytes is rejected outright ([`ProtocolError::
//! PayloadTooLarge`]); the protocol does not chunk.
//!
//! Decoding reads the header, looks the kind code up in the catalog, reads
//! exactly `length` further bytes, and deserializes into the matching
//! [`Message`] variant. Unknown kind codes and streams that close mid-frame
//! are errors — both fatal for the connection that produced them.
//!
//! The reader/writer functions are generic over `AsyncRead`/`AsyncWrite`,
//! so they work on a `TcpStream`, an owned half, or a byte slice in tests.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;
use crate::types::{Message, MessageKind};

/// Size of the wire header in bytes.
pub const HEADER_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// The fixed-size frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Wire code of the message kind.
    pub kind: u16,
    /// Byte length of the JSON payload that follows.
    pub length: u16,
}

impl Header {
    /// Serializes the header into its 4 wire bytes.
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let kind = self.kind.to_le_bytes();
        let length = self.length.to_le_bytes();
        [kind[0], kind[1], length[0], length[1]]
    }

    /// Parses a header from its 4 wire bytes.
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            kind: u16::from_le_bytes([bytes[0], bytes[1]]),
            length: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a message into one complete frame (header + payload).
///
/// # Errors
/// - [`ProtocolError::Encode`] if payload serialization fails.
/// - [`ProtocolError::PayloadTooLarge`] if the serialized payload exceeds
///   the 16-bit length field.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_payload(message)?;
    if payload.len() > u16::MAX as usize {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }

    let header = Header {
        kind: message.kind().code(),
        length: payload.len() as u16,
    };

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Serializes just the payload record for a message.
///
/// Kinds that carry no fields produce a zero-length payload.
fn encode_payload(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let bytes = match message {
        Message::Exit
        | Message::PlayerListRequest
        | Message::LobbyListRequest => Vec::new(),
        Message::Error(body) => to_vec(body)?,
        Message::VersionRequest(body) | Message::VersionResponse(body) => {
            to_vec(body)?
        }
        Message::LoginRequest(body) => to_vec(body)?,
        Message::LoginResponse(body) => to_vec(body)?,
        Message::PlayerListResponse(body) => to_vec(body)?,
        Message::CreateLobbyRequest(body) => to_vec(body)?,
        Message::CreateLobbyResponse(body) => to_vec(body)?,
        Message::JoinLobbyRequest(body)
        | Message::LeaveLobbyRequest(body) => to_vec(body)?,
        Message::JoinLobbyResponse(body)
        | Message::LeaveLobbyResponse(body) => to_vec(body)?,
        Message::LobbyKickRequest(body) => to_vec(body)?,
        Message::LobbyKickResponse(body) => to_vec(body)?,
        Message::GlobalChatRequest(body)
        | Message::LobbyChatRequest(body) => to_vec(body)?,
        Message::GlobalChatResponse(body)
        | Message::LobbyChatResponse(body) => to_vec(body)?,
        Message::LobbyListResponse(body) => to_vec(body)?,
        Message::CardPileRequest(body)
        | Message::DrawCardRequest(body) => to_vec(body)?,
        Message::CardPileResponse(body) => to_vec(body)?,
        Message::PlayCardRequest(body)
        | Message::DiscardCardRequest(body) => to_vec(body)?,
        Message::DrawCardResponse(body)
        | Message::PlayCardResponse(body)
        | Message::DiscardCardResponse(body) => to_vec(body)?,
    };
    Ok(bytes)
}

fn to_vec<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(ProtocolError::Encode)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Deserializes a payload into the message variant for `kind`.
///
/// This is the reverse half of the kind ⇄ payload lookup table. Kinds with
/// no payload fields ignore the payload bytes entirely.
///
/// # Errors
/// Returns [`ProtocolError::Decode`] if the payload doesn't match the
/// JSON shape fixed for `kind`.
pub fn decode_payload(
    kind: MessageKind,
    payload: &[u8],
) -> Result<Message, ProtocolError> {
    let message = match kind {
        MessageKind::Exit => Message::Exit,
        MessageKind::Error => Message::Error(from_slice(payload)?),
        MessageKind::VersionRequest => {
            Message::VersionRequest(from_slice(payload)?)
        }
        MessageKind::VersionResponse => {
            Message::VersionResponse(from_slice(payload)?)
        }
        MessageKind::LoginRequest => {
            Message::LoginRequest(from_slice(payload)?)
        }
        MessageKind::LoginResponse => {
            Message::LoginResponse(from_slice(payload)?)
        }
        MessageKind::PlayerListRequest => Message::PlayerListRequest,
        MessageKind::PlayerListResponse => {
            Message::PlayerListResponse(from_slice(payload)?)
        }
        MessageKind::CreateLobbyRequest => {
            Message::CreateLobbyRequest(from_slice(payload)?)
        }
        MessageKind::CreateLobbyResponse => {
            Message::CreateLobbyResponse(from_slice(payload)?)
        }
        MessageKind::JoinLobbyRequest => {
            Message::JoinLobbyRequest(from_slice(payload)?)
        }
        MessageKind::JoinLobbyResponse => {
            Message::JoinLobbyResponse(from_slice(payload)?)
        }
        MessageKind::LeaveLobbyRequest => {
            Message::LeaveLobbyRequest(from_slice(payload)?)
        }
        MessageKind::LeaveLobbyResponse => {
            Message::LeaveLobbyResponse(from_slice(payload)?)
        }
        MessageKind::LobbyKickRequest => {
            Message::LobbyKickRequest(from_slice(payload)?)
        }
        MessageKind::LobbyKickResponse => {
            Message::LobbyKickResponse(from_slice(payload)?)
        }
        MessageKind::GlobalChatRequest => {
            Message::GlobalChatRequest(from_slice(payload)?)
        }
        MessageKind::GlobalChatResponse => {
            Message::GlobalChatResponse(from_slice(payload)?)
        }
        MessageKind::LobbyChatRequest => {
            Message::LobbyChatRequest(from_slice(payload)?)
        }
        MessageKind::LobbyChatResponse => {
            Message::LobbyChatResponse(from_slice(payload)?)
        }
        MessageKind::LobbyListRequest => Message::LobbyListRequest,
        MessageKind::LobbyListResponse => {
            Message::LobbyListResponse(from_slice(payload)?)
        }
        MessageKind::CardPileRequest => {
            Message::CardPileRequest(from_slice(payload)?)
        }
        MessageKind::CardPileResponse => {
            Message::CardPileResponse(from_slice(payload)?)
        }
        MessageKind::DrawCardRequest => {
            Message::DrawCardRequest(from_slice(payload)?)
        }
        MessageKind::DrawCardResponse => {
            Message::DrawCardResponse(from_slice(payload)?)
        }
        MessageKind::PlayCardRequest => {
            Message::PlayCardRequest(from_slice(payload)?)
        }
        MessageKind::PlayCardResponse => {
            Message::PlayCardResponse(from_slice(payload)?)
        }
        MessageKind::DiscardCardRequest => {
            Message::DiscardCardRequest(from_slice(payload)?)
        }
        MessageKind::DiscardCardResponse => {
            Message::DiscardCardResponse(from_slice(payload)?)
        }
    };
    Ok(message)
}

fn from_slice<T: serde::de::DeserializeOwned>(
    payload: &[u8],
) -> Result<T, ProtocolError> {
    serde_json::from_slice(payload).map_err(ProtocolError::Decode)
}

// ---------------------------------------------------------------------------
// Stream I/O
// ---------------------------------------------------------------------------

/// Reads one complete message from an async byte stream.
///
/// Returns `Ok(None)` when the stream closes cleanly *between* frames —
/// the peer hung up and no partial data was lost. A stream that closes
/// mid-header or mid-payload yields [`ProtocolError::Truncated`]: the
/// sender declared more bytes than it delivered.
///
/// # Errors
/// - [`ProtocolError::UnknownKind`] for a header code outside the catalog.
/// - [`ProtocolError::Truncated`] for a frame cut short by stream close.
/// - [`ProtocolError::Decode`] for a payload that doesn't parse.
/// - [`ProtocolError::Io`] for underlying read failures.
pub async fn read_message<R>(
    reader: &mut R,
) -> Result<Option<Message>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader
            .read(&mut header_buf[filled..])
            .await
            .map_err(ProtocolError::Io)?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Truncated("header"));
        }
        filled += n;
    }

    let header = Header::from_bytes(header_buf);
    let kind = MessageKind::from_code(header.kind)
        .ok_or(ProtocolError::UnknownKind(header.kind))?;

    let mut payload = vec![0u8; header.length as usize];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::Truncated("payload")
        } else {
            ProtocolError::Io(e)
        }
    })?;

    decode_payload(kind, &payload).map(Some)
}

/// Encodes and writes one complete message as a single buffer.
///
/// A short or failed write surfaces as [`ProtocolError::Io`]; nothing is
/// retried here — retry policy belongs to the caller, and for this
/// protocol a write failure is a dead connection.
pub async fn write_message<W>(
    writer: &mut W,
    message: &Message,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(message)?;
    writer.write_all(&frame).await.map_err(ProtocolError::Io)?;
    writer.flush().await.map_err(ProtocolError::Io)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    /// One representative message per catalog kind, exercising empty
    /// strings and optional-field omission along the way.
    fn catalog_messages() -> Vec<Message> {
        let card = Card {
            id: "c-101".into(),
            number: 101,
            expansion: 341,
        };
        vec![
            Message::Exit,
            Message::Error(ErrorNotice {
                message: "Protocol version mismatch.".into(),
            }),
            Message::VersionRequest(VersionInfo { version: 1 }),
            Message::VersionResponse(VersionInfo { version: 1 }),
            Message::LoginRequest(LoginCredentials {
                token: "t1".into(),
                id: PlayerId::from("u1"),
                name: "Ann".into(),
            }),
            Message::LoginResponse(LoginAck {
                id: PlayerId::from("u1"),
                name: "Ann".into(),
            }),
            Message::PlayerListRequest,
            Message::PlayerListResponse(PlayerList {
                count: 0,
                players: vec![],
            }),
            Message::CreateLobbyRequest(LobbyName {
                name: String::new(),
            }),
            Message::CreateLobbyResponse(LobbyCreated {
                id: LobbyId::from("l-1"),
            }),
            Message::JoinLobbyRequest(LobbySelector {
                id: Some(LobbyId::from("l-1")),
                name: None,
            }),
            Message::JoinLobbyResponse(LobbyUpdate {
                id: LobbyId::from("l-1"),
                name: "casual".into(),
                success: true,
            }),
            Message::LeaveLobbyRequest(LobbySelector {
                id: None,
                name: Some("casual".into()),
            }),
            Message::LeaveLobbyResponse(LobbyUpdate {
                id: LobbyId::from("l-1"),
                name: "casual".into(),
                success: false,
            }),
            Message::LobbyKickRequest(KickTarget {
                target: PlayerId::from("u2"),
            }),
            Message::LobbyKickResponse(KickOutcome {
                target: PlayerId::from("u2"),
                success: true,
            }),
            Message::GlobalChatRequest(ChatText {
                message: String::new(),
            }),
            Message::GlobalChatResponse(ChatLine {
                name: "Ann".into(),
                message: "hello".into(),
            }),
            Message::LobbyChatRequest(ChatText {
                message: "gl hf".into(),
            }),
            Message::LobbyChatResponse(ChatLine {
                name: "Ann".into(),
                message: "gl hf".into(),
            }),
            Message::LobbyListRequest,
            Message::LobbyListResponse(LobbyList {
                count: 1,
                lobbies: vec![LobbyEntry {
                    id: LobbyId::from("l-1"),
                    name: "casual".into(),
                }],
            }),
            Message::CardPileRequest(PileSelector {
                pile: PileKind::Hand,
            }),
            Message::CardPileResponse(PileContents {
                pile: PileKind::Hand,
                cards: vec![card.clone()],
            }),
            Message::DrawCardRequest(PileSelector {
                pile: PileKind::Draw,
            }),
            Message::DrawCardResponse(CardResult { card: card.clone() }),
            Message::PlayCardRequest(CardChoice { card: "c-101".into() }),
            Message::PlayCardResponse(CardResult { card: card.clone() }),
            Message::DiscardCardRequest(CardChoice {
                card: "c-101".into(),
            }),
            Message::DiscardCardResponse(CardResult { card }),
        ]
    }

    // =====================================================================
    // Header layout
    // =====================================================================

    #[test]
    fn test_header_layout_is_little_endian() {
        let header = Header {
            kind: 2,
            length: 0x0103,
        };
        assert_eq!(header.to_bytes(), [2, 0, 0x03, 0x01]);
    }

    #[test]
    fn test_header_round_trip() {
        let header = Header {
            kind: 29,
            length: u16::MAX,
        };
        assert_eq!(Header::from_bytes(header.to_bytes()), header);
    }

    // =====================================================================
    // Round trips
    // =====================================================================

    #[tokio::test]
    async fn test_every_kind_round_trips() {
        // decode(encode(m)) == m for one representative of each kind.
        for message in catalog_messages() {
            let frame = encode(&message).expect("encode");
            let mut reader = frame.as_slice();
            let decoded = read_message(&mut reader)
                .await
                .expect("decode")
                .expect("one message");
            assert_eq!(decoded, message, "kind {}", message.kind());
        }
    }

    #[tokio::test]
    async fn test_write_then_read_over_buffer() {
        let message = Message::GlobalChatResponse(ChatLine {
            name: "Ann".into(),
            message: "hello".into(),
        });
        let mut buf = Vec::new();
        write_message(&mut buf, &message).await.expect("write");

        let mut reader = buf.as_slice();
        let decoded = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(decoded, message);
    }

    #[tokio::test]
    async fn test_back_to_back_frames_read_in_order() {
        let first = Message::PlayerListRequest;
        let second = Message::Exit;
        let mut buf = Vec::new();
        write_message(&mut buf, &first).await.unwrap();
        write_message(&mut buf, &second).await.unwrap();

        let mut reader = buf.as_slice();
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(first));
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(second));
        assert_eq!(read_message(&mut reader).await.unwrap(), None);
    }

    #[test]
    fn test_empty_payload_kinds_encode_to_header_only() {
        let frame = encode(&Message::Exit).unwrap();
        assert_eq!(frame.len(), HEADER_LEN);
        assert_eq!(
            Header::from_bytes([frame[0], frame[1], frame[2], frame[3]])
                .length,
            0
        );
    }

    // =====================================================================
    // Size boundaries
    // =====================================================================

    /// `{"message":"…"}` has 14 bytes of JSON overhead around the text.
    const CHAT_JSON_OVERHEAD: usize = 14;

    #[tokio::test]
    async fn test_payload_of_exactly_u16_max_round_trips() {
        let text = "a".repeat(u16::MAX as usize - CHAT_JSON_OVERHEAD);
        let message = Message::GlobalChatRequest(ChatText {
            message: text,
        });

        let frame = encode(&message).expect("should fit");
        assert_eq!(frame.len(), HEADER_LEN + u16::MAX as usize);

        let mut reader = frame.as_slice();
        let decoded = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_payload_over_u16_max_is_rejected() {
        let text = "a".repeat(u16::MAX as usize - CHAT_JSON_OVERHEAD + 1);
        let message = Message::GlobalChatRequest(ChatText {
            message: text,
        });

        let result = encode(&message);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadTooLarge(len)) if len == u16::MAX as usize + 1
        ));
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[tokio::test]
    async fn test_unknown_kind_fails_without_panicking() {
        let header = Header {
            kind: 0xBEEF,
            length: 2,
        };
        let mut frame = header.to_bytes().to_vec();
        frame.extend_from_slice(b"{}");

        let mut reader = frame.as_slice();
        let result = read_message(&mut reader).await;
        assert!(matches!(
            result,
            Err(ProtocolError::UnknownKind(0xBEEF))
        ));
    }

    #[tokio::test]
    async fn test_clean_eof_before_header_is_none() {
        let mut reader: &[u8] = &[];
        assert_eq!(read_message(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_eof_mid_header_is_truncated() {
        let mut reader: &[u8] = &[2, 0];
        let result = read_message(&mut reader).await;
        assert!(matches!(
            result,
            Err(ProtocolError::Truncated("header"))
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_payload_is_truncated() {
        // Declare 100 payload bytes, deliver only the real 13.
        let frame = encode(&Message::VersionRequest(VersionInfo {
            version: 1,
        }))
        .unwrap();
        let mut short = frame.clone();
        short[2] = 100; // bump declared length past what follows
        short[3] = 0;

        let mut reader = short.as_slice();
        let result = read_message(&mut reader).await;
        assert!(matches!(
            result,
            Err(ProtocolError::Truncated("payload"))
        ));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_decode_error() {
        let header = Header {
            kind: MessageKind::VersionRequest.code(),
            length: 3,
        };
        let mut frame = header.to_bytes().to_vec();
        frame.extend_from_slice(b"not");

        let mut reader = frame.as_slice();
        let result = read_message(&mut reader).await;
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_payload_wrong_shape_is_error() {
        let payload = br#"{"pile":"draw"}"#;
        let result = decode_payload(MessageKind::LoginRequest, payload);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
