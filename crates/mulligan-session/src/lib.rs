//! Player session management for Mulligan.
//!
//! This crate tracks who is connected and authenticated:
//!
//! 1. **Profile validation** — turning a credential token into a verified
//!    identity ([`ProfileStore`] trait)
//! 2. **Session tracking** — the authoritative roster of connected
//!    players ([`SessionRegistry`])
//! 3. **Transient player state** — per-session status affects with a
//!    per-session lock ([`Session`], [`Affect`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Server / handlers (above)  ← look sessions up, broadcast to them
//!     ↕
//! Session layer (this crate) ← identity + connection-scoped state
//!     ↕
//! Protocol & transport (below) ← PlayerId, Connection handles
//! ```
//!
//! A session lives exactly as long as its connection: it is created when
//! the login handshake completes and removed on protocol violation,
//! explicit exit, or transport error. There is no reconnection grace —
//! a dropped connection ends the session.

mod auth;
mod error;
mod registry;
mod session;

pub use auth::{Profile, ProfileStore, StaticProfiles};
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Affect, Session};
