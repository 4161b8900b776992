//! Flashcard deck generation from CSV and TSV tables.
//!
//! This crate holds the deck generator: it reads a table, decides the card
//! shape, infers tags, synthesizes templates, and hands an assembled deck
//! definition to [`deckgen_builder`] for packaging. It also manages the
//! tables themselves as decks of positional cards.
//!
//! # Quick Start
//!
//! ```no_run
//! use deckgen_engine::Workspace;
//!
//! # fn example() -> deckgen_engine::Result<()> {
//! let workspace = Workspace::open("my-decks")?;
//!
//! // One package per table under csv/
//! let report = workspace.generate().directory(&Default::default())?;
//! println!("Generated {} decks", report.generated.len());
//!
//! // Decks are the tables themselves
//! for deck in workspace.decks().list(&Default::default())? {
//!     println!("{}: {} cards {:?}", deck.id, deck.card_count, deck.tags);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Layout
//!
//! A workspace is one directory:
//!
//! | Path | Contents |
//! |------|----------|
//! | `csv/` | one table per deck, `<id>.csv` |
//! | `apkg/` | generated packages and `generation_history.json` |
//! | `media/` | images and sounds referenced by cards |
//! | `templates/` | custom templates as JSON |
//! | `config/config.json` | generation settings |
//!
//! # Tags
//!
//! Generated decks are tagged from the language, the card shape, the file
//! name tokens and a fixed category table (see [`tags::infer_tags`]). Every
//! category whose trigger word appears in the file name is added, so one
//! word can yield two tags: `french_present_tense_irregular` is tagged
//! `french, auto-generated, cloze, present, tense, irregular, verb`, the
//! last because `tense` also triggers the verb category.
//!
//! # Modules
//!
//! The analysis steps are usable on their own:
//! - [`structure`] - card shape and media detection
//! - [`tags`] - heuristic tag inference
//! - [`templates`] - question and answer formats
//! - [`assemble`] - deck names, stable identifiers, notes
//! - [`paste`] - header detection for pasted text

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;

pub mod assemble;
pub mod cards;
pub mod config;
pub mod decks;
pub mod generate;
pub mod history;
pub mod import;
pub mod paste;
pub mod structure;
pub mod table;
pub mod tags;
pub mod template_store;
pub mod templates;

use std::path::{Path, PathBuf};

pub use config::Config;
pub use error::{Error, Result};
pub use structure::CardShape;

use cards::CardEngine;
use decks::DeckEngine;
use generate::GenerateEngine;
use history::{HISTORY_FILE, History};
use import::ImportEngine;
use tags::TagEngine;
use template_store::TemplateEngine;

/// Locations inside a workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    /// Workspace root.
    pub root: PathBuf,
    /// Deck tables.
    pub csv_dir: PathBuf,
    /// Generated packages.
    pub apkg_dir: PathBuf,
    /// Media referenced by cards.
    pub media_dir: PathBuf,
    /// Custom templates.
    pub templates_dir: PathBuf,
    /// Configuration file.
    pub config_file: PathBuf,
    /// Generation history log.
    pub history_file: PathBuf,
}

impl WorkspacePaths {
    /// Standard layout under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let apkg_dir = root.join("apkg");
        Self {
            csv_dir: root.join("csv"),
            history_file: apkg_dir.join(HISTORY_FILE),
            apkg_dir,
            media_dir: root.join("media"),
            templates_dir: root.join("templates"),
            config_file: root.join("config").join("config.json"),
            root,
        }
    }

    /// Table backing deck `id`.
    pub fn deck_table(&self, id: &str) -> PathBuf {
        self.csv_dir.join(format!("{id}.csv"))
    }

    /// Package generated for deck `id`.
    pub fn deck_package(&self, id: &str) -> PathBuf {
        self.apkg_dir.join(format!("{id}.apkg"))
    }

    /// Create every directory of the layout.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.csv_dir,
            &self.apkg_dir,
            &self.media_dir,
            &self.templates_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(config_dir) = self.config_file.parent() {
            std::fs::create_dir_all(config_dir)?;
        }
        Ok(())
    }
}

/// A deck workspace with its configuration loaded.
///
/// Configuration is read once by [`Workspace::open`]. Changes made through
/// [`Workspace::config_mut`] only reach disk with [`Workspace::save_config`].
///
/// # Example
///
/// ```no_run
/// use deckgen_engine::Workspace;
///
/// # fn example() -> deckgen_engine::Result<()> {
/// let mut workspace = Workspace::open(".")?;
/// workspace
///     .config_mut()
///     .add_custom_tags("ser_estar", vec!["ser-estar".to_string()])?;
/// workspace.save_config()?;
///
/// let tags = workspace.tags().show("csv/ser_estar.csv".as_ref(), "spanish")?;
/// println!("{}", tags.join(", "));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    paths: WorkspacePaths,
    config: Config,
}

impl Workspace {
    /// Open the workspace at `root` and load its configuration.
    ///
    /// Directories are not created; see [`WorkspacePaths::ensure_dirs`].
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let paths = WorkspacePaths::new(root);
        let config = Config::load(&paths.config_file)?;
        Ok(Self { paths, config })
    }

    /// A workspace using `config` instead of the file on disk.
    pub fn with_config(root: impl AsRef<Path>, config: Config) -> Self {
        Self {
            paths: WorkspacePaths::new(root),
            config,
        }
    }

    /// Directory layout.
    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration. Call [`Workspace::save_config`] to persist.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Write the configuration back, replacing the file.
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.paths.config_file)
    }

    /// Generation history log.
    pub fn history(&self) -> History {
        History::new(&self.paths.history_file)
    }

    /// Access generation workflows.
    ///
    /// Single tables, whole directories, and merged packages.
    pub fn generate(&self) -> GenerateEngine<'_> {
        GenerateEngine::new(self)
    }

    /// Access deck management.
    pub fn decks(&self) -> DeckEngine<'_> {
        DeckEngine::new(self)
    }

    /// Access card management within decks.
    pub fn cards(&self) -> CardEngine<'_> {
        CardEngine::new(self)
    }

    /// Access stored templates.
    pub fn templates(&self) -> TemplateEngine<'_> {
        TemplateEngine::new(self)
    }

    /// Access tag listing and suggestions.
    pub fn tags(&self) -> TagEngine<'_> {
        TagEngine::new(self)
    }

    /// Access table and text imports.
    pub fn import(&self) -> ImportEngine<'_> {
        ImportEngine::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_paths() {
        let paths = WorkspacePaths::new("/data");
        assert_eq!(paths.csv_dir, PathBuf::from("/data/csv"));
        assert_eq!(
            paths.history_file,
            PathBuf::from("/data/apkg/generation_history.json")
        );
        assert_eq!(paths.deck_table("verbs"), PathBuf::from("/data/csv/verbs.csv"));
        assert_eq!(
            paths.config_file,
            PathBuf::from("/data/config/config.json")
        );
    }

    #[test]
    fn test_open_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        assert_eq!(workspace.config(), &Config::default());
    }

    #[test]
    fn test_save_config_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::open(dir.path()).unwrap();
        workspace.config_mut().create_reversed = true;
        workspace.save_config().unwrap();

        let reopened = Workspace::open(dir.path()).unwrap();
        assert!(reopened.config().create_reversed);
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::new(dir.path());
        paths.ensure_dirs().unwrap();
        assert!(paths.csv_dir.is_dir());
        assert!(paths.templates_dir.is_dir());
        assert!(paths.config_file.parent().unwrap().is_dir());
    }
}
