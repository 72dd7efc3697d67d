//! The card catalog: the on-disk card-data collaborator.
//!
//! The catalog is loaded once at server startup from a JSON array of
//! cards. Load failure is deliberately non-fatal — the server keeps
//! running with an empty catalog and logs a warning, because the network
//! backbone is useful (login, lobbies, chat) even when card data is
//! missing or malformed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mulligan_protocol::Card;

/// Errors from loading the catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The file could not be opened or read.
    #[error("failed to read card data: {0}")]
    Io(#[source] std::io::Error),

    /// The file contents were not a JSON array of cards.
    #[error("failed to parse card data: {0}")]
    Parse(#[source] serde_json::Error),
}

/// A lookup query against the catalog.
///
/// The id is optional: a query with an id matches exactly, while a query
/// without one falls back to the number + expansion pair.
#[derive(Debug, Clone, Default)]
pub struct CardQuery {
    pub id: Option<String>,
    pub number: u32,
    pub expansion: u32,
}

/// The loaded card collection.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<Card>,
}

impl CardCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-loaded card collection.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Loads the catalog from a JSON file containing an array of cards.
    pub fn load_from_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, CatalogError> {
        let file = File::open(path.as_ref()).map_err(CatalogError::Io)?;
        let cards = serde_json::from_reader(BufReader::new(file))
            .map_err(CatalogError::Parse)?;
        Ok(Self { cards })
    }

    /// Finds the card matching a query.
    ///
    /// Matches id + number + expansion first; a query whose id is absent
    /// (or matches nothing) falls back to number + expansion alone.
    pub fn query(&self, query: &CardQuery) -> Option<&Card> {
        if let Some(id) = &query.id {
            let exact = self.cards.iter().find(|card| {
                &card.id == id
                    && card.number == query.number
                    && card.expansion == query.expansion
            });
            if exact.is_some() {
                return exact;
            }
        }

        self.cards.iter().find(|card| {
            card.number == query.number && card.expansion == query.expansion
        })
    }

    /// Returns `true` if any card matches the query.
    pub fn contains(&self, query: &CardQuery) -> bool {
        self.query(query).is_some()
    }

    /// All loaded cards, in file order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the number of loaded cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` if no card data is loaded.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
