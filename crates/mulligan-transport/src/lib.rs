//! Transport layer for Mulligan: the TCP listener and per-connection
//! handles.
//!
//! This crate deliberately knows nothing about the wire protocol. It hands
//! out two things per accepted connection:
//!
//! - a [`Connection`]: a cheaply-cloneable *write* handle that registries
//!   hold so any task can send frames to a player (broadcasts included);
//! - the raw read half, owned exclusively by that connection's handler
//!   task, so reads never contend with writes.
//!
//! Framing lives upstairs in `mulligan-protocol`; this layer only moves
//! whole byte buffers and closes sockets.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{Connection, TcpTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
