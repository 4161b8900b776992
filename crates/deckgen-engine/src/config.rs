//! Process-wide generation settings.
//!
//! The configuration is a JSON object persisted at `config/config.json`.
//! Every key is optional on disk: anything missing is backfilled from
//! [`Config::default`] when loading. Saving replaces the whole file through a
//! temporary file in the same directory, so readers never observe a partial
//! write.
//!
//! ```json
//! {
//!   "custom_tags": { "ser_estar": ["ser-estar", "verbs"] },
//!   "tag_filters": { "grammar": true, "content": false },
//!   "templates": { "cloze": { "name": "Spanish Cloze" } },
//!   "css": ".card { font-family: arial; }",
//!   "media_enabled": true,
//!   "create_reversed": false
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::structure::CardShape;

/// Default card styling.
pub const DEFAULT_CSS: &str = ".card { font-family: arial; font-size: 20px; text-align: center; color: black; background-color: white; }
.cloze { font-weight: bold; color: blue; }
.extra { margin-top: 10px; }";

/// Generation settings shared by every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filename substring to extra tags.
    pub custom_tags: BTreeMap<String, Vec<String>>,
    /// Which tag inference stages run.
    pub tag_filters: TagFilters,
    /// Per card-shape template overrides, keyed by `basic` / `cloze`.
    pub templates: BTreeMap<String, TemplateOverride>,
    /// Card CSS.
    pub css: String,
    /// Package referenced media files found under `media/`.
    pub media_enabled: bool,
    /// Add a reversed template to basic decks with two or more fields.
    pub create_reversed: bool,
}

impl Default for Config {
    fn default() -> Self {
        let templates = BTreeMap::from([
            (
                CardShape::Basic.as_str().to_string(),
                TemplateOverride::named("Basic Card"),
            ),
            (
                CardShape::Cloze.as_str().to_string(),
                TemplateOverride::named("Cloze Card"),
            ),
        ]);

        Self {
            custom_tags: BTreeMap::new(),
            tag_filters: TagFilters::default(),
            templates,
            css: DEFAULT_CSS.to_string(),
            media_enabled: true,
            create_reversed: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults. Keys absent from the file are
    /// filled from the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration JSON, backfilling missing keys.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Replace the file at `path` with this configuration.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.persist(path)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Register extra tags for filenames containing `pattern`.
    ///
    /// Replaces any tags previously registered for the same pattern.
    pub fn add_custom_tags(&mut self, pattern: &str, tags: Vec<String>) -> Result<()> {
        if pattern.is_empty() {
            return Err(Error::InvalidInput("tag pattern must not be empty".into()));
        }
        if tags.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no tags given for pattern '{}'",
                pattern
            )));
        }
        self.custom_tags.insert(pattern.to_string(), tags);
        Ok(())
    }

    /// Set the template override for a card shape.
    pub fn set_template_override(&mut self, shape: CardShape, template: TemplateOverride) {
        self.templates.insert(shape.as_str().to_string(), template);
    }

    /// Replace the card CSS.
    pub fn set_css(&mut self, css: impl Into<String>) {
        self.css = css.into();
    }

    /// The override configured for a card shape, if any.
    pub fn template_override(&self, shape: CardShape) -> Option<&TemplateOverride> {
        self.templates.get(shape.as_str())
    }
}

/// Gates for the tag inference stages.
///
/// Every gate defaults to enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFilters {
    /// Add the deck language.
    pub language: bool,
    /// Add `auto-generated`.
    pub source: bool,
    /// Add `cloze` or `basic`.
    pub card_type: bool,
    /// Add meaningful words from the filename.
    pub filename: bool,
    /// Part-of-speech categories (and the `person` column tag).
    pub grammar: bool,
    /// Vocabulary and tense categories.
    pub content: bool,
    /// Constructions such as `ir-a` or `ser-estar`.
    pub language_construct: bool,
    /// Add `media` when the table references images or sounds.
    pub media: bool,
}

impl Default for TagFilters {
    fn default() -> Self {
        Self::all()
    }
}

impl TagFilters {
    /// Every stage enabled.
    pub fn all() -> Self {
        Self {
            language: true,
            source: true,
            card_type: true,
            filename: true,
            grammar: true,
            content: true,
            language_construct: true,
            media: true,
        }
    }

    /// Every stage disabled. The custom pattern stage still runs.
    pub fn none() -> Self {
        Self {
            language: false,
            source: false,
            card_type: false,
            filename: false,
            grammar: false,
            content: false,
            language_construct: false,
            media: false,
        }
    }
}

/// Template keys that replace the synthesized defaults.
///
/// Keys left unset keep the synthesized value for the deck's field layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOverride {
    /// Template name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Question format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qfmt: Option<String>,
    /// Answer format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afmt: Option<String>,
}

impl TemplateOverride {
    /// An override that only renames the template.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Load a complete template from a JSON file.
    ///
    /// The file must set `name`, `qfmt`, and `afmt`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!("template file {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let template: TemplateOverride = serde_json::from_str(&content)?;

        for (key, value) in [
            ("name", &template.name),
            ("qfmt", &template.qfmt),
            ("afmt", &template.afmt),
        ] {
            if value.is_none() {
                return Err(Error::InvalidInput(format!(
                    "template is missing required key '{}'",
                    key
                )));
            }
        }

        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_keys_are_backfilled() {
        let config = Config::parse(r#"{"tag_filters": {"grammar": false}, "css": "x"}"#).unwrap();
        assert!(!config.tag_filters.grammar);
        assert!(config.tag_filters.content);
        assert_eq!(config.css, "x");
        assert!(config.media_enabled);
        assert!(!config.create_reversed);
        assert_eq!(
            config.template_override(CardShape::Cloze),
            Some(&TemplateOverride::named("Cloze Card"))
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("config.json");

        let mut config = Config::default();
        config
            .add_custom_tags("ser_estar", vec!["ser-estar".to_string()])
            .unwrap();
        config.create_reversed = true;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"css": "old", "unknown": 1}"#).unwrap();

        let mut config = Config::load(&path).unwrap();
        config.css = "new".to_string();
        config.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["css"], "new");
        assert!(raw.get("unknown").is_none());
        assert!(raw.get("tag_filters").is_some());
    }

    #[test]
    fn test_add_custom_tags_rejects_empty() {
        let mut config = Config::default();
        assert!(config.add_custom_tags("", vec!["x".into()]).is_err());
        assert!(config.add_custom_tags("verbs", vec![]).is_err());
    }

    #[test]
    fn test_template_file_requires_all_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"name": "Mine", "qfmt": "{{Front}}"}"#).unwrap();

        let err = TemplateOverride::from_file(&path).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("afmt"));

        std::fs::write(
            &path,
            r#"{"name": "Mine", "qfmt": "{{Front}}", "afmt": "{{Back}}"}"#,
        )
        .unwrap();
        let template = TemplateOverride::from_file(&path).unwrap();
        assert_eq!(template.name.as_deref(), Some("Mine"));
    }
}
