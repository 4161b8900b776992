//! Deck definition types.
//!
//! A [`DeckDefinition`] is the descriptor handed to the packager: models
//! (field schema, templates, CSS), decks, notes, and media. It can be
//! written to and read from TOML so a generated deck can be inspected or
//! edited by hand before packaging.
//!
//! # Example TOML
//!
//! ```toml
//! [package]
//! name = "Spanish Present Tense"
//!
//! [[models]]
//! name = "Spanish Present Tense Model"
//! kind = "cloze"
//! fields = ["Text", "Translation"]
//! id = 1607392319
//!
//! [[models.templates]]
//! name = "Cloze Card"
//! qfmt = "{{cloze:Text}}"
//! afmt = "{{cloze:Text}}<hr><b>Translation:</b> {{Translation}}<br>"
//!
//! [[decks]]
//! name = "Spanish Present Tense"
//! id = 2059400110
//!
//! [[notes]]
//! deck = "Spanish Present Tense"
//! model = "Spanish Present Tense Model"
//! tags = ["spanish", "cloze"]
//!
//! [notes.fields]
//! Text = "Yo {{c1::hablo}} español."
//! Translation = "I speak Spanish."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};

/// Root structure for a deck definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckDefinition {
    /// Package metadata.
    pub package: PackageInfo,

    /// Model (note type) definitions.
    #[serde(default)]
    pub models: Vec<ModelDef>,

    /// Deck definitions.
    #[serde(default)]
    pub decks: Vec<DeckDef>,

    /// Note definitions.
    #[serde(default)]
    pub notes: Vec<NoteDef>,

    /// Media file definitions.
    #[serde(default)]
    pub media: Vec<MediaDef>,
}

impl DeckDefinition {
    /// Load a deck definition from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a deck definition from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let def: DeckDefinition = toml::from_str(content)?;
        def.validate()?;
        Ok(def)
    }

    /// Serialize the definition as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::TomlSerialize(e.to_string()))
    }

    /// Write the definition to a TOML file.
    pub fn write_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Validate the deck definition for consistency.
    pub fn validate(&self) -> Result<()> {
        for model in &self.models {
            if model.fields.is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "model '{}' has no fields",
                    model.name
                )));
            }
            if model.templates.is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "model '{}' has no templates",
                    model.name
                )));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = model.fields.iter().find(|f| !seen.insert(f.as_str())) {
                return Err(Error::InvalidDefinition(format!(
                    "model '{}' has duplicate field '{}'",
                    model.name, dup
                )));
            }
        }

        let deck_names: HashSet<_> = self.decks.iter().map(|d| d.name.as_str()).collect();

        for note in &self.notes {
            let model = self
                .get_model(&note.model)
                .ok_or_else(|| Error::ModelNotFound(note.model.clone()))?;

            for field_name in note.fields.keys() {
                if !model.fields.contains(field_name) {
                    return Err(Error::FieldNotFound {
                        model: note.model.clone(),
                        field: field_name.clone(),
                    });
                }
            }

            if !deck_names.contains(note.deck.as_str()) {
                return Err(Error::DeckNotFound(note.deck.clone()));
            }
        }

        Ok(())
    }

    /// Get a model by name.
    pub fn get_model(&self, name: &str) -> Option<&ModelDef> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Get a deck by name.
    pub fn get_deck(&self, name: &str) -> Option<&DeckDef> {
        self.decks.iter().find(|d| d.name == name)
    }

    /// Get notes for a specific deck.
    pub fn notes_for_deck(&self, deck_name: &str) -> impl Iterator<Item = &NoteDef> {
        self.notes.iter().filter(move |n| n.deck == deck_name)
    }

    /// Combine several definitions into one deck.
    ///
    /// Every model from every part is kept (the first definition wins when two
    /// parts carry a model with the same name), all notes are re-targeted to a
    /// single deck called `name` with identifier `deck_id`, and media entries
    /// are de-duplicated by file name.
    pub fn merged(name: &str, deck_id: i64, parts: &[DeckDefinition]) -> Self {
        let mut models: Vec<ModelDef> = Vec::new();
        let mut notes = Vec::new();
        let mut media: Vec<MediaDef> = Vec::new();

        for part in parts {
            for model in &part.models {
                if !models.iter().any(|m| m.name == model.name) {
                    models.push(model.clone());
                }
            }
            for note in &part.notes {
                let mut note = note.clone();
                note.deck = name.to_string();
                notes.push(note);
            }
            for item in &part.media {
                if !media.iter().any(|m| m.name == item.name) {
                    media.push(item.clone());
                }
            }
        }

        Self {
            package: PackageInfo {
                name: name.to_string(),
                version: default_version(),
                author: None,
                description: Some(format!("Merged from {} decks", parts.len())),
            },
            models,
            decks: vec![DeckDef {
                name: name.to_string(),
                description: None,
                id: Some(deck_id),
            }],
            notes,
            media,
        }
    }
}

/// Package metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name.
    pub name: String,

    /// Package version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Package author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Package description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Kind of note type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// One card per template.
    #[default]
    Standard,
    /// One card per cloze number in the first field.
    Cloze,
}

/// Model (note type) definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDef {
    /// Model name (must be unique).
    pub name: String,

    /// Standard or cloze.
    #[serde(default)]
    pub kind: ModelKind,

    /// Field names in order.
    pub fields: Vec<String>,

    /// Card templates.
    pub templates: Vec<TemplateDef>,

    /// CSS styling for cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,

    /// Which field to sort by (default: first field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,

    /// Model ID (derived from the name if not specified).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl ModelDef {
    /// Get the sort field index.
    pub fn sort_field_index(&self) -> usize {
        self.sort_field
            .as_ref()
            .and_then(|name| self.fields.iter().position(|f| f == name))
            .unwrap_or(0)
    }
}

/// Card template definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    /// Template name.
    pub name: String,

    /// Question format.
    pub qfmt: String,

    /// Answer format.
    pub afmt: String,
}

/// Deck definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckDef {
    /// Deck name (use :: for hierarchy, e.g., "Parent::Child").
    pub name: String,

    /// Deck description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Deck ID (derived from the name if not specified).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Note definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDef {
    /// Deck name to add note to.
    pub deck: String,

    /// Model name for this note.
    pub model: String,

    /// Field values.
    pub fields: HashMap<String, String>,

    /// Tags for this note.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Custom GUID (auto-generated if not specified).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

impl NoteDef {
    /// Get field values in model field order.
    pub fn fields_ordered(&self, model: &ModelDef) -> Vec<String> {
        model
            .fields
            .iter()
            .map(|f| self.fields.get(f).cloned().unwrap_or_default())
            .collect()
    }

    /// Get tags as a space-separated string with surrounding spaces.
    ///
    /// Whitespace inside a tag would split it in the collection, so it is
    /// replaced with `-`.
    pub fn tags_string(&self) -> String {
        if self.tags.is_empty() {
            String::new()
        } else {
            let tags: Vec<String> = self
                .tags
                .iter()
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join("-"))
                .filter(|t| !t.is_empty())
                .collect();
            format!(" {} ", tags.join(" "))
        }
    }
}

/// Media file definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDef {
    /// Filename as referenced in note fields (e.g., "audio.mp3").
    pub name: String,

    /// Path to the source file.
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOZE_TOML: &str = r#"
[package]
name = "Test Deck"

[[models]]
name = "Cloze"
kind = "cloze"
fields = ["Text", "Translation"]

[[models.templates]]
name = "Cloze Card"
qfmt = "{{cloze:Text}}"
afmt = "{{cloze:Text}}<hr>{{Translation}}"

[[decks]]
name = "Test Deck"

[[notes]]
deck = "Test Deck"
model = "Cloze"
tags = ["test"]

[notes.fields]
Text = "Yo {{c1::soy}}"
Translation = "I am"
"#;

    fn model(name: &str, fields: &[&str]) -> ModelDef {
        ModelDef {
            name: name.to_string(),
            kind: ModelKind::Standard,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            templates: vec![TemplateDef {
                name: "Card 1".to_string(),
                qfmt: format!("{{{{{}}}}}", fields[0]),
                afmt: "{{FrontSide}}".to_string(),
            }],
            css: None,
            sort_field: None,
            id: None,
        }
    }

    #[test]
    fn test_parse_cloze_definition() {
        let def = DeckDefinition::parse(CLOZE_TOML).unwrap();
        assert_eq!(def.package.name, "Test Deck");
        assert_eq!(def.models[0].kind, ModelKind::Cloze);
        assert_eq!(def.notes[0].fields.get("Translation").unwrap(), "I am");
    }

    #[test]
    fn test_toml_round_trip_keeps_kind() {
        let def = DeckDefinition::parse(CLOZE_TOML).unwrap();
        let text = def.to_toml_string().unwrap();
        let again = DeckDefinition::parse(&text).unwrap();
        assert_eq!(again.models[0].kind, ModelKind::Cloze);
        assert_eq!(again.models[0].templates, def.models[0].templates);
    }

    #[test]
    fn test_invalid_model_reference() {
        let toml = r#"
[package]
name = "Test"

[[decks]]
name = "Test Deck"

[[notes]]
deck = "Test Deck"
model = "NonExistent"

[notes.fields]
Front = "Q"
"#;

        let result = DeckDefinition::parse(toml);
        assert!(matches!(result, Err(Error::ModelNotFound(_))));
    }

    #[test]
    fn test_invalid_field_reference() {
        let toml = r#"
[package]
name = "Test"

[[models]]
name = "Basic"
fields = ["Front", "Back"]

[[models.templates]]
name = "Card 1"
qfmt = "{{Front}}"
afmt = "{{Back}}"

[[decks]]
name = "Test Deck"

[[notes]]
deck = "Test Deck"
model = "Basic"

[notes.fields]
Front = "Q"
InvalidField = "X"
"#;

        let result = DeckDefinition::parse(toml);
        assert!(matches!(result, Err(Error::FieldNotFound { .. })));
    }

    #[test]
    fn test_model_without_fields_is_rejected() {
        let mut def = DeckDefinition::parse(CLOZE_TOML).unwrap();
        def.models[0].fields.clear();
        def.notes.clear();
        assert!(matches!(def.validate(), Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_fields_ordered() {
        let model = model("Test", &["A", "B", "C"]);

        let mut fields = HashMap::new();
        fields.insert("C".to_string(), "third".to_string());
        fields.insert("A".to_string(), "first".to_string());

        let note = NoteDef {
            deck: "Test".to_string(),
            model: "Test".to_string(),
            fields,
            tags: vec![],
            guid: None,
        };

        assert_eq!(note.fields_ordered(&model), vec!["first", "", "third"]);
    }

    #[test]
    fn test_tags_string_replaces_inner_whitespace() {
        let note = NoteDef {
            deck: "D".to_string(),
            model: "M".to_string(),
            fields: HashMap::new(),
            tags: vec!["spanish".to_string(), "going to".to_string()],
            guid: None,
        };
        assert_eq!(note.tags_string(), " spanish going-to ");
    }

    #[test]
    fn test_merged_retargets_notes_and_keeps_models() {
        let first = DeckDefinition::parse(CLOZE_TOML).unwrap();
        let mut second = first.clone();
        second.models = vec![model("Basic", &["Front", "Back"])];
        second.decks[0].name = "Other".to_string();
        second.notes[0].deck = "Other".to_string();
        second.notes[0].model = "Basic".to_string();
        second.notes[0].fields = HashMap::from([("Front".to_string(), "Q".to_string())]);

        let merged = DeckDefinition::merged("All", 42, &[first, second]);
        assert_eq!(merged.decks.len(), 1);
        assert_eq!(merged.decks[0].id, Some(42));
        assert_eq!(merged.models.len(), 2);
        assert_eq!(merged.notes.len(), 2);
        assert!(merged.notes.iter().all(|n| n.deck == "All"));
        merged.validate().unwrap();
    }
}
