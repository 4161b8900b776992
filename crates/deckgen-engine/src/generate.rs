//! Package generation.
//!
//! Turns tables under `csv/` into `.apkg` files under `apkg/`, one package
//! per table, optionally followed by a merged package holding every deck of
//! the batch. Successful generations are appended to the history log.
//!
//! # Example
//!
//! ```no_run
//! use deckgen_engine::Workspace;
//! use deckgen_engine::generate::BatchOptions;
//!
//! # fn example() -> deckgen_engine::Result<()> {
//! let workspace = Workspace::open(".")?;
//!
//! let options = BatchOptions {
//!     language: "spanish".to_string(),
//!     merge_name: Some("Spanish Everything".to_string()),
//!     ..Default::default()
//! };
//! let report = workspace.generate().directory(&options)?;
//! println!("{} generated, {} failed", report.generated.len(), report.failures.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use deckgen_builder::ids::stable_id;
use deckgen_builder::{ApkgBuilder, DeckDefinition, MediaDef};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::Workspace;
use crate::assemble::{self, DeckDescriptor};
use crate::decks::check_plain_name;
use crate::error::{Error, Result};
use crate::history::HistoryEntry;
use crate::structure::media_references;
use crate::table::Table;

/// A package written for one table.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    /// Source table.
    pub csv_path: PathBuf,
    /// Written package.
    pub output_path: PathBuf,
    /// Deck display name.
    pub deck_name: String,
    /// Deck tags.
    pub tags: Vec<String>,
    /// Number of notes written.
    pub notes: usize,
    /// Media file names packaged with the deck.
    pub media: Vec<String>,
}

/// A table that could not be turned into a package.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateFailure {
    /// File that failed.
    pub file: PathBuf,
    /// Error message.
    pub error: String,
}

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Language applied to every deck.
    pub language: String,
    /// File names under `csv/` to process. Empty means every `.csv` file.
    pub files: Vec<String>,
    /// Also write one package holding every generated deck.
    pub merge_name: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            language: assemble::GENERIC_LANGUAGE.to_string(),
            files: Vec::new(),
            merge_name: None,
        }
    }
}

/// Report of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Packages written.
    pub generated: Vec<Generated>,
    /// Tables that failed, in processing order.
    pub failures: Vec<GenerateFailure>,
    /// Merged package, when requested and written.
    pub merged: Option<PathBuf>,
}

/// Generation workflow engine.
#[derive(Debug)]
pub struct GenerateEngine<'a> {
    workspace: &'a Workspace,
}

impl<'a> GenerateEngine<'a> {
    pub(crate) fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Assemble the packaging definition for one table.
    ///
    /// Media references are resolved against `media/` when media handling is
    /// enabled. Only files that exist are included.
    pub fn definition(
        &self,
        csv_path: &Path,
        language: &str,
    ) -> Result<(DeckDescriptor, DeckDefinition)> {
        let config = self.workspace.config();
        let (descriptor, table) = assemble::assemble(csv_path, language, config)?;
        let media = if config.media_enabled {
            self.collect_media(&table)
        } else {
            Vec::new()
        };
        let notes = descriptor.notes(&table);
        let definition = descriptor.to_definition(notes, media);
        Ok((descriptor, definition))
    }

    /// Write the package for one table to `apkg/<stem>.apkg`.
    ///
    /// # Arguments
    ///
    /// * `csv_path` - Table to convert
    /// * `language` - Deck language (`generic` for none)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use deckgen_engine::Workspace;
    /// # fn example() -> deckgen_engine::Result<()> {
    /// let workspace = Workspace::open(".")?;
    /// let generated = workspace
    ///     .generate()
    ///     .deck("csv/spanish_verbs.csv".as_ref(), "spanish")?;
    /// println!("Wrote {}", generated.output_path.display());
    /// # Ok(())
    /// # }
    /// ```
    pub fn deck(&self, csv_path: &Path, language: &str) -> Result<Generated> {
        self.generate_one(csv_path, language).map(|(generated, _)| generated)
    }

    fn generate_one(
        &self,
        csv_path: &Path,
        language: &str,
    ) -> Result<(Generated, DeckDefinition)> {
        let paths = self.workspace.paths();
        let (descriptor, mut definition) = self.definition(csv_path, language)?;
        let output_path = paths.apkg_dir.join(format!("{}.apkg", descriptor.stem));
        std::fs::create_dir_all(&paths.apkg_dir)?;

        self.write_package(&mut definition, &output_path)?;

        let generated = Generated {
            csv_path: csv_path.to_path_buf(),
            output_path,
            deck_name: descriptor.name.clone(),
            tags: descriptor.tags.clone(),
            notes: definition.notes.len(),
            media: definition.media.iter().map(|m| m.name.clone()).collect(),
        };
        info!(
            deck = %generated.deck_name,
            notes = generated.notes,
            media = generated.media.len(),
            output = %generated.output_path.display(),
            "Generated deck"
        );

        let entry = HistoryEntry::now(csv_path, &generated.output_path, generated.tags.clone());
        if let Err(e) = self.workspace.history().record(entry) {
            warn!(error = %e, "Could not record generation history");
        }

        Ok((generated, definition))
    }

    /// Generate every requested table, continuing past failures.
    ///
    /// When `merge_name` is set, the definitions of all successful decks are
    /// also combined into `apkg/<merge_name>.apkg`, with every note moved into
    /// one deck of that name. A merge failure is reported like a table failure.
    pub fn directory(&self, options: &BatchOptions) -> Result<BatchReport> {
        if let Some(name) = &options.merge_name {
            check_plain_name("merge name", name)?;
        }

        let mut report = BatchReport::default();
        let files = if options.files.is_empty() {
            self.discover()?
        } else {
            self.explicit_files(&options.files, &mut report)
        };

        if files.is_empty() && report.failures.is_empty() {
            warn!(dir = %self.workspace.paths().csv_dir.display(), "No CSV files found");
            return Ok(report);
        }

        let mut definitions = Vec::new();
        for file in files {
            debug!(file = %file.display(), "Processing table");
            match self.generate_one(&file, &options.language) {
                Ok((generated, definition)) => {
                    report.generated.push(generated);
                    definitions.push(definition);
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Generation failed");
                    report.failures.push(GenerateFailure {
                        file,
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Some(name) = &options.merge_name {
            if definitions.is_empty() {
                warn!(name = %name, "Nothing generated, skipping merge");
            } else {
                match self.merge(name, &definitions) {
                    Ok(path) => report.merged = Some(path),
                    Err(e) => {
                        warn!(name = %name, error = %e, "Merge failed");
                        report.failures.push(GenerateFailure {
                            file: self.merged_path(name),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    /// Combine deck definitions into `apkg/<name>.apkg`.
    pub fn merge(&self, name: &str, definitions: &[DeckDefinition]) -> Result<PathBuf> {
        check_plain_name("merge name", name)?;
        let mut merged = DeckDefinition::merged(name, stable_id(name), definitions);
        let output_path = self.merged_path(name);
        std::fs::create_dir_all(&self.workspace.paths().apkg_dir)?;
        self.write_package(&mut merged, &output_path)?;
        info!(
            decks = definitions.len(),
            notes = merged.notes.len(),
            output = %output_path.display(),
            "Merged decks"
        );
        Ok(output_path)
    }

    /// Every `.csv` file directly under `csv/`, sorted by name.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.workspace.paths().csv_dir;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_csv_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn explicit_files(&self, names: &[String], report: &mut BatchReport) -> Vec<PathBuf> {
        let dir = &self.workspace.paths().csv_dir;
        let mut files = Vec::new();
        for name in names {
            if let Err(e) = check_plain_name("file name", name) {
                warn!(file = %name, "Skipping file outside csv/");
                report.failures.push(GenerateFailure {
                    file: PathBuf::from(name),
                    error: e.to_string(),
                });
                continue;
            }
            if !has_csv_extension(Path::new(name)) {
                debug!(file = %name, "Skipping non-CSV file");
                continue;
            }
            files.push(dir.join(name));
        }
        files
    }

    fn merged_path(&self, name: &str) -> PathBuf {
        self.workspace
            .paths()
            .apkg_dir
            .join(format!("{}.apkg", name))
    }

    /// Local media files referenced anywhere in `table` that exist under
    /// `media/`, by file name.
    fn collect_media(&self, table: &Table) -> Vec<MediaDef> {
        let media_dir = &self.workspace.paths().media_dir;
        let mut seen = HashSet::new();
        let mut media = Vec::new();

        let references = table.rows.iter().flatten().flat_map(|cell| media_references(cell));
        for reference in references {
            let Some(name) = Path::new(&reference)
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
            else {
                continue;
            };
            if !seen.insert(name.clone()) {
                continue;
            }
            if media_dir.join(&name).is_file() {
                media.push(MediaDef {
                    path: name.clone(),
                    name,
                });
            } else {
                debug!(file = %name, "Referenced media not found");
            }
        }

        media
    }

    /// Write a package, dropping media when a media file cannot be read.
    fn write_package(&self, definition: &mut DeckDefinition, output_path: &Path) -> Result<()> {
        let media_dir = &self.workspace.paths().media_dir;
        let result = ApkgBuilder::new(definition.clone())
            .media_base_path(media_dir)
            .write_to_file(output_path);

        match result {
            Err(deckgen_builder::Error::MediaNotFound(file)) => {
                warn!(file = %file, "Media unreadable, writing package without media");
                definition.media.clear();
                ApkgBuilder::new(definition.clone()).write_to_file(output_path)?;
                Ok(())
            }
            other => other.map_err(Error::from),
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
