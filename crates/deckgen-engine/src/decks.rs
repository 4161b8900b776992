//! Deck management.
//!
//! A deck is one table under `csv/`; its identifier is the file stem. Deck
//! metadata (name, language, shape, tags, templates) is derived from the
//! table every time it is loaded.
//!
//! # Example
//!
//! ```no_run
//! use deckgen_engine::{CardShape, Workspace};
//! use deckgen_engine::decks::NewDeck;
//!
//! # fn example() -> deckgen_engine::Result<()> {
//! let workspace = Workspace::open(".")?;
//!
//! let deck = workspace.decks().create(&NewDeck::new("Spanish Food", CardShape::Basic))?;
//! assert_eq!(deck.id, "spanish_food");
//! assert_eq!(deck.language, "spanish");
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use deckgen_builder::TemplateDef;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::Workspace;
use crate::assemble::{self, detect_language};
use crate::error::{Error, Result};
use crate::structure::CardShape;
use crate::table::Table;

/// A deck and its derived metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    /// Identifier (table file stem).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Language detected from the identifier.
    pub language: String,
    /// Card shape.
    pub card_type: CardShape,
    /// Ordered field names.
    pub fields: Vec<String>,
    /// Deck-level tags.
    pub tags: Vec<String>,
    /// Card templates.
    pub templates: Vec<TemplateDef>,
    /// Card CSS.
    pub css: String,
    /// Number of cards.
    pub card_count: usize,
    /// Backing table.
    pub csv_path: PathBuf,
    /// Generated package, when one exists.
    pub apkg_path: Option<PathBuf>,
    /// Last modification of the table.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Filters for [`DeckEngine::list`].
#[derive(Debug, Clone, Default)]
pub struct DeckFilter {
    /// Only decks in this language.
    pub language: Option<String>,
    /// Only decks carrying this tag.
    pub tag: Option<String>,
}

/// Parameters for a new, empty deck.
#[derive(Debug, Clone)]
pub struct NewDeck {
    /// Display name; the identifier is derived from it.
    pub name: String,
    /// Shape used to pick default columns.
    pub card_type: CardShape,
    /// Explicit columns, overriding the defaults for `card_type`.
    pub fields: Option<Vec<String>>,
}

impl NewDeck {
    /// A deck with the default columns for `card_type`.
    pub fn new(name: impl Into<String>, card_type: CardShape) -> Self {
        Self {
            name: name.into(),
            card_type,
            fields: None,
        }
    }

    /// Use explicit columns.
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    fn columns(&self) -> Vec<String> {
        match &self.fields {
            Some(fields) => fields.clone(),
            None => default_columns(self.card_type),
        }
    }
}

/// Columns of a scaffolded deck.
pub fn default_columns(card_type: CardShape) -> Vec<String> {
    let names: &[&str] = match card_type {
        CardShape::Cloze => &["Text", "Translation", "Explanation"],
        CardShape::Basic => &["Front", "Back"],
    };
    names.iter().map(|s| s.to_string()).collect()
}

/// Derive a deck or template identifier from a name.
///
/// The name is lowercased, characters other than letters, digits, `_`, `-`
/// and whitespace are removed, and runs of `-` and whitespace become `_`.
///
/// ```
/// use deckgen_engine::decks::sanitize_id;
///
/// assert_eq!(sanitize_id("Spanish Verbs - Present!").unwrap(), "spanish_verbs_present");
/// assert!(sanitize_id("???").is_err());
/// ```
pub fn sanitize_id(name: &str) -> Result<String> {
    let mut id = String::with_capacity(name.len());
    let mut in_gap = false;
    for c in name.trim().to_lowercase().chars() {
        if c == '-' || c.is_whitespace() {
            in_gap = true;
        } else if c.is_alphanumeric() || c == '_' {
            if in_gap {
                id.push('_');
                in_gap = false;
            }
            id.push(c);
        }
    }
    if in_gap && !id.is_empty() {
        id.push('_');
    }

    if id.is_empty() {
        return Err(Error::InvalidInput(format!(
            "name '{}' has no usable characters",
            name
        )));
    }
    Ok(id)
}

/// Deck management engine.
#[derive(Debug)]
pub struct DeckEngine<'a> {
    workspace: &'a Workspace,
}

impl<'a> DeckEngine<'a> {
    pub(crate) fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// List decks, most recently modified first.
    ///
    /// Tables that cannot be read are skipped with a warning.
    pub fn list(&self, filter: &DeckFilter) -> Result<Vec<Deck>> {
        let mut decks = Vec::new();
        for path in self.workspace.generate().discover()? {
            let Ok(id) = assemble::file_stem(&path) else {
                continue;
            };
            let deck = match self.load(&id) {
                Ok((deck, _)) => deck,
                Err(e) => {
                    warn!(deck = %id, error = %e, "Skipping unreadable deck");
                    continue;
                }
            };

            if filter
                .language
                .as_ref()
                .is_some_and(|lang| !deck.language.eq_ignore_ascii_case(lang))
            {
                continue;
            }
            if filter
                .tag
                .as_ref()
                .is_some_and(|tag| !deck.tags.iter().any(|t| t == tag))
            {
                continue;
            }
            decks.push(deck);
        }

        decks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(decks)
    }

    /// Get one deck.
    pub fn get(&self, id: &str) -> Result<Deck> {
        self.load(id).map(|(deck, _)| deck)
    }

    /// Create a deck holding only a header row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a deck with the derived identifier
    /// exists and [`Error::InvalidInput`] if the name or columns are unusable.
    pub fn create(&self, new: &NewDeck) -> Result<Deck> {
        let id = sanitize_id(&new.name)?;
        let columns = new.columns();
        if columns.is_empty() || columns.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::InvalidInput("deck columns must be non-empty".into()));
        }
        if let Some((i, column)) = columns
            .iter()
            .enumerate()
            .find(|(i, c)| columns[..*i].contains(c))
        {
            return Err(Error::InvalidInput(format!(
                "duplicate field '{}' at position {}",
                column,
                i + 1
            )));
        }

        let path = self.workspace.paths().deck_table(&id);
        if path.exists() {
            return Err(Error::Conflict(format!(
                "deck with name '{}' already exists",
                new.name
            )));
        }

        Table::new(columns).write(&path)?;
        info!(deck = %id, "Created deck");
        self.get(&id)
    }

    /// Rename a deck, moving its table to the identifier derived from
    /// `new_name`.
    pub fn rename(&self, id: &str, new_name: &str) -> Result<Deck> {
        let old_path = self.table_path(id)?;
        if !old_path.is_file() {
            return Err(not_found(id));
        }

        let new_id = sanitize_id(new_name)?;
        if new_id == id {
            return self.get(id);
        }
        let new_path = self.workspace.paths().deck_table(&new_id);
        if new_path.exists() {
            return Err(Error::Conflict(format!(
                "deck with name '{}' already exists",
                new_name
            )));
        }

        std::fs::rename(&old_path, &new_path)?;
        info!(from = %id, to = %new_id, "Renamed deck");
        self.get(&new_id)
    }

    /// Delete a deck and its generated package.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.table_path(id)?;
        if !path.is_file() {
            return Err(not_found(id));
        }
        std::fs::remove_file(&path)?;

        let package = self.workspace.paths().deck_package(id);
        if package.is_file() {
            std::fs::remove_file(&package)?;
        }
        info!(deck = %id, "Deleted deck");
        Ok(())
    }

    /// Generate the package for a deck.
    pub fn build(&self, id: &str) -> Result<Deck> {
        let deck = self.get(id)?;
        self.workspace
            .generate()
            .deck(&deck.csv_path, &deck.language)?;
        self.get(id)
    }

    /// Load a deck together with its table.
    pub(crate) fn load(&self, id: &str) -> Result<(Deck, Table)> {
        let path = self.table_path(id)?;
        if !path.is_file() {
            return Err(not_found(id));
        }

        let table = Table::read(&path)?;
        let language = detect_language(id);
        let descriptor = assemble::describe(id, &table, language, self.workspace.config())?;

        let updated_at = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        let package = self.workspace.paths().deck_package(id);

        let deck = Deck {
            id: id.to_string(),
            name: descriptor.name,
            language: descriptor.language,
            card_type: descriptor.shape,
            fields: descriptor.fields,
            tags: descriptor.tags,
            templates: descriptor.templates,
            css: descriptor.css,
            card_count: table.rows.len(),
            csv_path: path,
            apkg_path: package.is_file().then_some(package),
            updated_at,
        };
        debug!(deck = %id, cards = deck.card_count, "Loaded deck");
        Ok((deck, table))
    }

    /// Path of the table for `id`, rejecting identifiers that would escape
    /// the `csv/` directory.
    pub(crate) fn table_path(&self, id: &str) -> Result<PathBuf> {
        check_plain_name("deck id", id)?;
        Ok(self.workspace.paths().deck_table(id))
    }
}

/// Reject names that would not stay inside their workspace directory when
/// joined onto it.
pub(crate) fn check_plain_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(Error::InvalidInput(format!("invalid {} '{}'", what, name)));
    }
    Ok(())
}

pub(crate) fn not_found(id: &str) -> Error {
    Error::NotFound(format!("deck '{}'", id))
}
