//! Lobby management for Mulligan.
//!
//! A lobby is a pre-match grouping of at most two seated players, one of
//! whom is the host. Lobbies are passive rosters — they hold identities,
//! not connections, and every mutation goes through the
//! [`LobbyRegistry`] so the registry's invariants hold by construction:
//!
//! - a player sits in at most one lobby at a time;
//! - a lobby never seats more than two players;
//! - the host is always a current member (the earliest remaining member
//!   is promoted when the host departs);
//! - a lobby emptied by its last leave is removed by that operation,
//!   never garbage-collected behind the caller's back.

mod error;
mod lobby;
mod registry;

pub use error::LobbyError;
pub use lobby::{Lobby, MAX_SEATS};
pub use registry::{LeaveOutcome, LobbyRegistry};
