//! Deck assembly.
//!
//! Turns one table into a [`DeckDescriptor`]: display name, stable
//! identifiers, structure, tags, templates and CSS. The descriptor then
//! populates notes from the table rows and converts into a
//! [`DeckDefinition`] for packaging.

use std::collections::HashMap;
use std::path::Path;

use deckgen_builder::ids::{fnv1a, stable_id};
use deckgen_builder::{
    DeckDef, DeckDefinition, MediaDef, ModelDef, ModelKind, NoteDef, PackageInfo, TemplateDef,
};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::structure::{self, CardShape};
use crate::table::Table;
use crate::tags;
use crate::templates::{self, REVERSED_TAG};

/// Language value meaning "no particular language".
pub const GENERIC_LANGUAGE: &str = "generic";

/// Languages recognized in deck identifiers and pasted headers.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "spanish",
    "english",
    "french",
    "german",
    "italian",
    "portuguese",
    "japanese",
    "chinese",
    "korean",
];

/// Tag added when sampled rows reference images or sounds.
pub const MEDIA_TAG: &str = "media";

/// First supported language named in `id`, or [`GENERIC_LANGUAGE`].
pub fn detect_language(id: &str) -> &'static str {
    let id = id.to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| id.contains(*lang))
        .copied()
        .unwrap_or(GENERIC_LANGUAGE)
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Human-readable deck name for a file stem.
///
/// ```
/// use deckgen_engine::assemble::deck_display_name;
///
/// assert_eq!(deck_display_name("present_tense-verbs", "spanish"), "Spanish Present Tense Verbs");
/// assert_eq!(deck_display_name("capitals", "generic"), "Capitals");
/// ```
pub fn deck_display_name(stem: &str, language: &str) -> String {
    let words: Vec<String> = stem
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();
    let name = words.join(" ");
    if language.eq_ignore_ascii_case(GENERIC_LANGUAGE) || language.is_empty() {
        name
    } else {
        format!("{} {}", capitalize(language), name)
    }
}

/// Stable model identifier for a file stem.
pub fn model_id(stem: &str) -> i64 {
    stable_id(stem)
}

/// Stable deck identifier for a file stem, never equal to [`model_id`].
pub fn deck_id(stem: &str) -> i64 {
    let id = stable_id(&format!("deck:{stem}"));
    if id == model_id(stem) { id + 1 } else { id }
}

/// Everything needed to turn a table into cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckDescriptor {
    /// File stem the deck was built from.
    pub stem: String,
    /// Display name.
    pub name: String,
    /// Note type name.
    pub model_name: String,
    /// Stable note type identifier.
    pub model_id: i64,
    /// Stable deck identifier.
    pub deck_id: i64,
    /// Lowercase language.
    pub language: String,
    /// Card shape.
    pub shape: CardShape,
    /// Ordered field names.
    pub fields: Vec<String>,
    /// Field name to source column name.
    pub mapping: Vec<(String, String)>,
    /// Question and answer templates.
    #[serde(skip)]
    pub templates: Vec<TemplateDef>,
    /// Card CSS.
    pub css: String,
    /// Deck-level tags, de-duplicated in insertion order.
    pub tags: Vec<String>,
    /// Sampled rows reference images or sounds.
    pub has_media: bool,
}

/// Assemble the descriptor for an in-memory table.
pub fn describe(
    stem: &str,
    table: &Table,
    language: &str,
    config: &Config,
) -> Result<DeckDescriptor> {
    let language = language.to_lowercase();
    let structure = structure::analyze(table);
    let mut deck_tags = tags::infer_tags(stem, &structure.fields, &language, config);
    let set = templates::synthesize(&structure.fields, structure.shape, config)?;

    if structure.has_media && config.tag_filters.media {
        deck_tags.push(MEDIA_TAG.to_string());
    }
    if set.reversed {
        deck_tags.push(REVERSED_TAG.to_string());
    }

    let name = deck_display_name(stem, &language);
    let descriptor = DeckDescriptor {
        stem: stem.to_string(),
        model_name: format!("{name} Model"),
        name,
        model_id: model_id(stem),
        deck_id: deck_id(stem),
        language,
        shape: structure.shape,
        fields: structure.fields,
        mapping: structure.mapping,
        templates: set.templates,
        css: config.css.clone(),
        tags: tags::dedupe(deck_tags),
        has_media: structure.has_media,
    };
    debug!(
        stem,
        shape = %descriptor.shape,
        fields = descriptor.fields.len(),
        tags = ?descriptor.tags,
        "Assembled deck"
    );
    Ok(descriptor)
}

/// Read a table file and assemble its descriptor.
///
/// Returns the descriptor together with the table so callers can populate
/// notes without reading the file again.
pub fn assemble(path: &Path, language: &str, config: &Config) -> Result<(DeckDescriptor, Table)> {
    let stem = file_stem(path)?;
    let table = Table::read(path)?;
    let descriptor = describe(&stem, &table, language, config)?;
    Ok((descriptor, table))
}

/// UTF-8 file stem of `path`.
pub fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("no usable file name in {}", path.display())))
}

impl DeckDescriptor {
    /// Whether notes use the cloze note type.
    pub fn is_cloze(&self) -> bool {
        self.shape == CardShape::Cloze
    }

    /// One note per table row, tagged with the deck tags.
    ///
    /// Fields whose mapped column is missing from `table` are left empty.
    pub fn notes(&self, table: &Table) -> Vec<NoteDef> {
        let columns: Vec<Option<usize>> = self
            .fields
            .iter()
            .map(|field| {
                self.mapping
                    .iter()
                    .find(|(f, _)| f == field)
                    .and_then(|(_, column)| table.column_index(column))
            })
            .collect();

        table
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = columns
                    .iter()
                    .map(|c| c.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                    .collect();
                let key = format!("{}\x1f{}", self.stem, values.join("\x1f"));
                let guid = format!("{:x}", fnv1a(&key));
                let fields: HashMap<String, String> =
                    self.fields.iter().cloned().zip(values).collect();
                NoteDef {
                    deck: self.name.clone(),
                    model: self.model_name.clone(),
                    fields,
                    tags: self.tags.clone(),
                    guid: Some(guid),
                }
            })
            .collect()
    }

    /// The packaging definition for this deck.
    pub fn to_definition(&self, notes: Vec<NoteDef>, media: Vec<MediaDef>) -> DeckDefinition {
        DeckDefinition {
            package: PackageInfo {
                name: self.name.clone(),
                version: "1.0.0".to_string(),
                author: None,
                description: Some(format!("Generated from {}", self.stem)),
            },
            models: vec![ModelDef {
                name: self.model_name.clone(),
                kind: if self.is_cloze() {
                    ModelKind::Cloze
                } else {
                    ModelKind::Standard
                },
                fields: self.fields.clone(),
                templates: self.templates.clone(),
                css: Some(self.css.clone()),
                sort_field: None,
                id: Some(self.model_id),
            }],
            decks: vec![DeckDef {
                name: self.name.clone(),
                description: None,
                id: Some(self.deck_id),
            }],
            notes,
            media,
        }
    }
}
