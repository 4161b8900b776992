//! Error types for deckgen-engine.
//!
//! Errors fall into the categories callers act on:
//!
//! 1. **Not found**: a deck, card, template, or file does not exist
//! 2. **Invalid input**: the content was rejected before anything was written
//! 3. **Conflict**: the identifier derived for a new deck or template is taken
//! 4. **Lower-level failures**: I/O, CSV, JSON, and packaging errors
//!
//! # Example
//!
//! ```no_run
//! use deckgen_engine::{Error, Workspace};
//!
//! # fn example() -> deckgen_engine::Result<()> {
//! let workspace = Workspace::open(".")?;
//!
//! match workspace.decks().get("spanish_verbs") {
//!     Ok(deck) => println!("{} cards", deck.card_count),
//!     Err(Error::NotFound(what)) => eprintln!("{} not found", what),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Result type for deckgen-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A deck, card, template, or file does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Rejected input (empty table, missing template key, bad name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The derived identifier already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A table could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The packaging step failed.
    #[error("build error: {0}")]
    Build(#[from] deckgen_builder::Error),
}

impl Error {
    /// Whether this error means the referenced item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether this error is a rejection of caller-supplied input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Whether this error is an identifier collision.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}
