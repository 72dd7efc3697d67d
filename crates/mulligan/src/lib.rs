//! # Mulligan
//!
//! The network backbone of a multiplayer card-game service: a framed TCP
//! wire protocol, a connection-handling server, and the concurrent
//! registries (players, lobbies, event observers) that give the protocol
//! meaning.
//!
//! The game rules themselves live behind the [`GameEngine`] seam and the
//! profile service behind [`ProfileStore`](mulligan_session::ProfileStore);
//! this crate owns everything between the socket and those seams.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mulligan::prelude::*;
//!
//! # struct MyEngine;
//! # impl GameEngine for MyEngine {
//! #     async fn card_pile(&self, _: &PlayerId, _: PileKind) -> Result<Vec<Card>, EngineError> { Ok(vec![]) }
//! #     async fn draw_card(&self, _: &PlayerId, _: PileKind) -> Result<Card, EngineError> { Err(EngineError("empty".into())) }
//! #     async fn play_card(&self, _: &PlayerId, _: &str) -> Result<Card, EngineError> { Err(EngineError("empty".into())) }
//! #     async fn discard_card(&self, _: &PlayerId, _: &str) -> Result<Card, EngineError> { Err(EngineError("empty".into())) }
//! # }
//! # async fn run() -> Result<(), ServerError> {
//! let profiles = StaticProfiles::new().with_profile("t1", "u1", "Ann");
//! let server = ServerBuilder::new()
//!     .bind("0.0.0.0:8888")
//!     .catalog_path("data/cards.json")
//!     .build(profiles, MyEngine)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod catalog;
mod engine;
mod error;
mod handler;
mod responses;
mod server;

pub use catalog::{CardCatalog, CardQuery, CatalogError};
pub use engine::{EngineError, GameEngine};
pub use error::ServerError;
pub use server::{Server, ServerBuilder, ServerConfig, ServerHandle};

/// The types most servers need, in one import.
pub mod prelude {
    pub use crate::{
        CardCatalog, CardQuery, EngineError, GameEngine, Server,
        ServerBuilder, ServerConfig, ServerError, ServerHandle,
    };
    pub use mulligan_events::{EventBus, Observer, ServerEvent};
    pub use mulligan_lobby::{LobbyError, LobbyRegistry};
    pub use mulligan_protocol::{
        Card, LobbyId, Message, MessageKind, PROTOCOL_VERSION, PileKind,
        PlayerId,
    };
    pub use mulligan_session::{
        Profile, ProfileStore, SessionError, StaticProfiles,
    };
}
