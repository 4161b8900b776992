//! Deck creation from uploaded tables and pasted text.
//!
//! An import writes a new table under `csv/` and returns the deck it
//! describes. Existing decks are never overwritten.
//!
//! # Example
//!
//! ```no_run
//! use deckgen_engine::Workspace;
//! use deckgen_engine::paste::PasteOptions;
//!
//! # fn example() -> deckgen_engine::Result<()> {
//! let workspace = Workspace::open(".")?;
//!
//! let deck = workspace
//!     .import()
//!     .text("English\tSpanish\nhello\thola", "Spanish Greetings", &PasteOptions::default())?;
//! println!("{}: {} cards", deck.id, deck.card_count);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use tracing::info;

use crate::Workspace;
use crate::assemble;
use crate::decks::{Deck, sanitize_id};
use crate::error::{Error, Result};
use crate::paste::{self, PasteOptions};
use crate::table::Table;

/// Import workflow engine.
#[derive(Debug)]
pub struct ImportEngine<'a> {
    workspace: &'a Workspace,
}

impl<'a> ImportEngine<'a> {
    pub(crate) fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Import a CSV or TSV file as a new deck.
    ///
    /// The deck is named `deck_name`, or after the file stem when no name is
    /// given. The delimiter is detected from the first line and kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist,
    /// [`Error::InvalidInput`] if it holds no cards, and [`Error::Conflict`]
    /// if a deck with the derived identifier exists.
    pub fn csv(&self, path: &Path, deck_name: Option<&str>) -> Result<Deck> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("file {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let name = match deck_name {
            Some(name) => name.to_string(),
            None => assemble::file_stem(path)?,
        };
        self.csv_text(&content, &name)
    }

    /// Import table content as a new deck named `deck_name`.
    pub fn csv_text(&self, content: &str, deck_name: &str) -> Result<Deck> {
        let table = Table::parse(content)?;
        if table.rows.is_empty() {
            return Err(Error::InvalidInput("CSV file is empty".into()));
        }
        self.store(table, deck_name)
    }

    /// Import pasted, separated text as a new deck named `deck_name`.
    ///
    /// See [`paste::parse_text`] for header detection and column presets.
    pub fn text(&self, text: &str, deck_name: &str, options: &PasteOptions) -> Result<Deck> {
        let table = paste::parse_text(text, options)?;
        self.store(table, deck_name)
    }

    fn store(&self, table: Table, deck_name: &str) -> Result<Deck> {
        let id = sanitize_id(deck_name)?;
        let path = self.workspace.paths().deck_table(&id);
        if path.exists() {
            return Err(Error::Conflict(format!(
                "deck with name '{}' already exists",
                deck_name
            )));
        }

        table.write(&path)?;
        info!(deck = %id, cards = table.rows.len(), "Imported deck");
        self.workspace.decks().get(&id)
    }
}
