//! Card management within a deck.
//!
//! Cards are the rows of a deck's table and are identified by position.
//! Deleting a card moves every later card down by one, so identifiers are
//! only valid until the next deletion. Every change rewrites the whole table;
//! concurrent writers to one deck are not coordinated.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use deckgen_engine::Workspace;
//! use deckgen_engine::cards::NewCard;
//!
//! # fn example() -> deckgen_engine::Result<()> {
//! let workspace = Workspace::open(".")?;
//!
//! let card = workspace.cards().create(
//!     "spanish_food",
//!     NewCard::new(HashMap::from([
//!         ("Front".to_string(), "manzana".to_string()),
//!         ("Back".to_string(), "apple".to_string()),
//!     ])),
//! )?;
//! workspace.cards().delete("spanish_food", card.id)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::Workspace;
use crate::decks::{Deck, DeckEngine};
use crate::error::{Error, Result};
use crate::table::Table;
use crate::tags::dedupe;

/// One card of a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    /// Position in the deck, starting at 0.
    pub id: usize,
    /// Owning deck.
    pub deck_id: String,
    /// Field values; every deck field is present.
    pub fields: HashMap<String, String>,
    /// Deck tags followed by card-specific tags.
    pub tags: Vec<String>,
}

/// A card to append.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    /// Field values. Missing fields are stored empty and unknown fields are
    /// ignored.
    pub fields: HashMap<String, String>,
    /// Extra tags reported on the returned card. They are not stored.
    pub tags: Vec<String>,
}

impl NewCard {
    /// A card with the given field values.
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self {
            fields,
            tags: Vec::new(),
        }
    }

    /// Add card-specific tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Card management engine.
#[derive(Debug)]
pub struct CardEngine<'a> {
    workspace: &'a Workspace,
}

impl<'a> CardEngine<'a> {
    pub(crate) fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    fn decks(&self) -> DeckEngine<'a> {
        DeckEngine::new(self.workspace)
    }

    /// All cards of a deck in order.
    pub fn list(&self, deck_id: &str) -> Result<Vec<Card>> {
        let (deck, table) = self.decks().load(deck_id)?;
        Ok(table
            .records()
            .into_iter()
            .enumerate()
            .map(|(id, fields)| card(&deck, id, fields, &[]))
            .collect())
    }

    /// The card at position `id`.
    pub fn get(&self, deck_id: &str, id: usize) -> Result<Card> {
        let (deck, table) = self.decks().load(deck_id)?;
        let fields = table.record(id).ok_or_else(|| card_not_found(deck_id, id))?;
        Ok(card(&deck, id, fields, &[]))
    }

    /// Append a card.
    pub fn create(&self, deck_id: &str, new: NewCard) -> Result<Card> {
        let mut cards = self.create_batch(deck_id, vec![new])?;
        cards
            .pop()
            .ok_or_else(|| Error::InvalidInput("no card created".into()))
    }

    /// Append several cards with one rewrite of the table.
    pub fn create_batch(&self, deck_id: &str, new: Vec<NewCard>) -> Result<Vec<Card>> {
        let (deck, mut table) = self.decks().load(deck_id)?;
        let start = table.rows.len();

        for card in &new {
            warn_unknown_fields(&table, deck_id, card.fields.keys());
            let row = table.row_from(&card.fields);
            table.rows.push(row);
        }
        table.write(&deck.csv_path)?;
        debug!(deck = %deck_id, added = new.len(), total = table.rows.len(), "Added cards");

        Ok(new
            .into_iter()
            .enumerate()
            .map(|(offset, card_data)| {
                let id = start + offset;
                let fields = table.record(id).unwrap_or_default();
                card(&deck, id, fields, &card_data.tags)
            })
            .collect())
    }

    /// Replace the given field values of the card at position `id`.
    ///
    /// Fields that are not part of the deck are ignored. The card count never
    /// changes.
    pub fn update(
        &self,
        deck_id: &str,
        id: usize,
        fields: &HashMap<String, String>,
    ) -> Result<Card> {
        let (deck, mut table) = self.decks().load(deck_id)?;
        if id >= table.rows.len() {
            return Err(card_not_found(deck_id, id));
        }

        warn_unknown_fields(&table, deck_id, fields.keys());
        for (name, value) in fields {
            if let Some(column) = table.column_index(name) {
                table.rows[id][column] = value.clone();
            }
        }
        table.write(&deck.csv_path)?;
        debug!(deck = %deck_id, card = id, "Updated card");

        let fields = table.record(id).unwrap_or_default();
        Ok(card(&deck, id, fields, &[]))
    }

    /// Remove the card at position `id`; later cards move down by one.
    pub fn delete(&self, deck_id: &str, id: usize) -> Result<()> {
        let (deck, mut table) = self.decks().load(deck_id)?;
        if id >= table.rows.len() {
            return Err(card_not_found(deck_id, id));
        }

        table.rows.remove(id);
        table.write(&deck.csv_path)?;
        debug!(deck = %deck_id, card = id, remaining = table.rows.len(), "Deleted card");
        Ok(())
    }
}

fn card(deck: &Deck, id: usize, fields: HashMap<String, String>, extra_tags: &[String]) -> Card {
    let tags = deck.tags.iter().chain(extra_tags).cloned().collect();
    Card {
        id,
        deck_id: deck.id.clone(),
        fields,
        tags: dedupe(tags),
    }
}

fn warn_unknown_fields<'k>(table: &Table, deck_id: &str, names: impl Iterator<Item = &'k String>) {
    for name in names {
        if table.column_index(name).is_none() {
            warn!(deck = %deck_id, field = %name, "Ignoring field not in deck");
        }
    }
}

fn card_not_found(deck_id: &str, id: usize) -> Error {
    Error::NotFound(format!("card {} in deck '{}'", id, deck_id))
}
