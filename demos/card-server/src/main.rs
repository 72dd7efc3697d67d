//! A runnable Mulligan server with an in-memory card engine.
//!
//! Configuration comes from the environment:
//!
//! - `MULLIGAN_ADDR`  — bind address (default `127.0.0.1:8888`)
//! - `MULLIGAN_CARDS` — card catalog path (default `data/cards.json`;
//!   a missing file is a warning, not a failure)
//! - `RUST_LOG`       — tracing filter (e.g. `mulligan=debug`)
//!
//! Logins use a small built-in profile table: tokens `t1`/`t2`/`t3` for
//! players `u1`/`u2`/`u3`.

use std::collections::HashMap;
use std::sync::Mutex;

use mulligan::prelude::*;
use rand::Rng;
use tracing_subscriber::EnvFilter;

/// A toy rules engine: every player draws from one shared deck into a
/// private hand, and plays or discards cards out of that hand.
struct DemoEngine {
    deck: Vec<Card>,
    hands: Mutex<HashMap<PlayerId, Vec<Card>>>,
}

impl DemoEngine {
    fn new() -> Self {
        let deck = (1..=20)
            .map(|number| Card {
                id: format!("c-{number}"),
                number,
                expansion: 341,
            })
            .collect();
        Self {
            deck,
            hands: Mutex::new(HashMap::new()),
        }
    }

    fn take_from_hand(
        &self,
        player: &PlayerId,
        card_id: &str,
    ) -> Result<Card, EngineError> {
        let mut hands = self.hands.lock().expect("hand lock poisoned");
        let hand = hands.entry(player.clone()).or_default();
        let position = hand
            .iter()
            .position(|card| card.id == card_id)
            .ok_or_else(|| {
                EngineError(format!("card {card_id} is not in your hand"))
            })?;
        Ok(hand.remove(position))
    }
}

impl GameEngine for DemoEngine {
    async fn card_pile(
        &self,
        player: &PlayerId,
        pile: PileKind,
    ) -> Result<Vec<Card>, EngineError> {
        match pile {
            PileKind::Hand => Ok(self
                .hands
                .lock()
                .expect("hand lock poisoned")
                .get(player)
                .cloned()
                .unwrap_or_default()),
            PileKind::Draw => Ok(self.deck.clone()),
            _ => Ok(vec![]),
        }
    }

    async fn draw_card(
        &self,
        player: &PlayerId,
        _pile: PileKind,
    ) -> Result<Card, EngineError> {
        let card = {
            let mut rng = rand::rng();
            self.deck[rng.random_range(0..self.deck.len())].clone()
        };
        self.hands
            .lock()
            .expect("hand lock poisoned")
            .entry(player.clone())
            .or_default()
            .push(card.clone());
        Ok(card)
    }

    async fn play_card(
        &self,
        player: &PlayerId,
        card_id: &str,
    ) -> Result<Card, EngineError> {
        self.take_from_hand(player, card_id)
    }

    async fn discard_card(
        &self,
        player: &PlayerId,
        card_id: &str,
    ) -> Result<Card, EngineError> {
        self.take_from_hand(player, card_id)
    }
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("MULLIGAN_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8888".to_string());
    let cards = std::env::var("MULLIGAN_CARDS")
        .unwrap_or_else(|_| "data/cards.json".to_string());

    let profiles = StaticProfiles::new()
        .with_profile("t1", "u1", "Ann")
        .with_profile("t2", "u2", "Bo")
        .with_profile("t3", "u3", "Cy");

    let server = ServerBuilder::new()
        .bind(&addr)
        .catalog_path(&cards)
        .build(profiles, DemoEngine::new())
        .await?;

    tracing::info!(%addr, "card server ready");
    server.run().await
}
