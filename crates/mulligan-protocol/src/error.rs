//! Error types for the protocol layer.
//!
//! Each crate in Mulligan defines its own error enum. A `ProtocolError`
//! always means the problem is in framing or serialization — not in
//! networking, sessions, or lobbies.

/// Errors that can occur while framing or unframing messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a payload record failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A payload didn't match the JSON shape fixed for its kind.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The header carried a kind code outside the catalog.
    /// Fatal for the connection — there is no way to resynchronize.
    #[error("unknown message kind {0}")]
    UnknownKind(u16),

    /// The serialized payload exceeds the 16-bit length field.
    /// Oversized payloads are rejected, never chunked.
    #[error("payload of {0} bytes exceeds the u16 length field")]
    PayloadTooLarge(usize),

    /// The stream closed with a frame partially read.
    #[error("stream closed mid-frame while reading the {0}")]
    Truncated(&'static str),

    /// An underlying read or write failed.
    #[error("i/o failure: {0}")]
    Io(#[source] std::io::Error),
}
