//! The game-rules seam.
//!
//! Mulligan doesn't implement card rules — draw piles, turn order, and
//! card effects belong to the game engine the operator plugs in. This
//! module defines that seam: the [`GameEngine`] trait, one async method
//! per card operation in the message catalog. The connection handler
//! validates the session, calls the engine, and relays the opaque
//! [`Card`] data back onto the wire; an engine failure becomes a wire
//! error message and never closes the connection.

use mulligan_protocol::{Card, PileKind, PlayerId};

/// A failure reported by the game-rules engine.
///
/// The message is relayed verbatim to the requesting client, so engines
/// should phrase it for players ("draw pile is empty"), not for logs.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// The card-game rules behind the card operations.
///
/// `Send + Sync + 'static` because one engine instance is shared across
/// every connection task for the server's lifetime; the returned futures
/// must be `Send` so they can be polled from any runtime thread.
pub trait GameEngine: Send + Sync + 'static {
    /// Returns the contents of one of the player's piles.
    fn card_pile(
        &self,
        player: &PlayerId,
        pile: PileKind,
    ) -> impl std::future::Future<Output = Result<Vec<Card>, EngineError>> + Send;

    /// Draws the top card of the given pile for the player.
    fn draw_card(
        &self,
        player: &PlayerId,
        pile: PileKind,
    ) -> impl std::future::Future<Output = Result<Card, EngineError>> + Send;

    /// Plays the identified card from the player's hand.
    fn play_card(
        &self,
        player: &PlayerId,
        card_id: &str,
    ) -> impl std::future::Future<Output = Result<Card, EngineError>> + Send;

    /// Discards the identified card from the player's hand.
    fn discard_card(
        &self,
        player: &PlayerId,
        card_id: &str,
    ) -> impl std::future::Future<Output = Result<Card, EngineError>> + Send;
}
