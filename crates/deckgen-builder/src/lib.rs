//! Deck definitions and `.apkg` packaging for generated flashcard decks.
//!
//! This crate is the packaging half of deckgen: it takes a fully assembled
//! [`DeckDefinition`] (models, templates, decks, notes, media) and writes an
//! Anki package. Definitions can also be round-tripped through TOML, which is
//! how generated decks are exported for inspection and how hand-written decks
//! are packaged.
//!
//! # Features
//!
//! - `apkg` (default): Enable .apkg file generation
//!
//! # Usage
//!
//! ```no_run
//! use deckgen_builder::DeckBuilder;
//!
//! # fn main() -> deckgen_builder::Result<()> {
//! let builder = DeckBuilder::from_file("vocabulary.toml")?.media_base_path("media");
//! builder.write_apkg("vocabulary.apkg")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cloze;
pub mod error;
pub mod ids;
pub mod schema;

#[cfg(feature = "apkg")]
mod sql;

#[cfg(feature = "apkg")]
mod apkg;

pub use error::{Error, Result};
pub use schema::{
    DeckDef, DeckDefinition, MediaDef, ModelDef, ModelKind, NoteDef, PackageInfo, TemplateDef,
};

#[cfg(feature = "apkg")]
pub use apkg::ApkgBuilder;

/// Front door for packaging a deck definition.
///
/// # Example
///
/// ```
/// use deckgen_builder::DeckBuilder;
///
/// let toml = r#"
/// [package]
/// name = "Test Deck"
///
/// [[models]]
/// name = "Basic"
/// fields = ["Front", "Back"]
///
/// [[models.templates]]
/// name = "Card 1"
/// qfmt = "{{Front}}"
/// afmt = "{{FrontSide}}<hr>{{Back}}"
///
/// [[decks]]
/// name = "Test Deck"
/// "#;
///
/// let builder = DeckBuilder::parse(toml).unwrap();
/// assert_eq!(builder.definition().package.name, "Test Deck");
/// ```
pub struct DeckBuilder {
    definition: DeckDefinition,
    #[cfg(feature = "apkg")]
    media_base_path: Option<std::path::PathBuf>,
}

impl DeckBuilder {
    /// Create a new builder from a deck definition.
    pub fn new(definition: DeckDefinition) -> Self {
        Self {
            definition,
            #[cfg(feature = "apkg")]
            media_base_path: None,
        }
    }

    /// Load a deck definition from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or references unknown models, decks, or fields.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let definition = DeckDefinition::from_file(path)?;
        Ok(Self::new(definition))
    }

    /// Load a deck definition from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let definition = DeckDefinition::parse(content)?;
        Ok(Self::new(definition))
    }

    /// Set the base path for resolving relative media file paths.
    #[cfg(feature = "apkg")]
    pub fn media_base_path(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.media_base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Get the underlying deck definition.
    pub fn definition(&self) -> &DeckDefinition {
        &self.definition
    }

    /// Write the deck definition to an `.apkg` file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The definition is inconsistent
    /// - The output path cannot be written to
    /// - Media files referenced in the definition cannot be read
    #[cfg(feature = "apkg")]
    pub fn write_apkg(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let mut builder = ApkgBuilder::new(self.definition.clone());
        if let Some(ref media_path) = self.media_base_path {
            builder = builder.media_base_path(media_path);
        }
        builder.write_to_file(path)
    }

    /// Write the deck definition to a TOML file.
    pub fn write_toml(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.definition.write_toml(path)
    }
}
