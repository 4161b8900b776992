//! Stored card templates.
//!
//! Three templates are built in (`basic`, `basic_reversed`, `cloze`). Custom
//! templates are JSON files under `templates/`, named by their identifier:
//!
//! ```json
//! {
//!   "name": "Verb Drill",
//!   "type": "basic",
//!   "qfmt": "{{Infinitive}}",
//!   "afmt": "{{FrontSide}}<hr id=\"answer\">{{Conjugation}}",
//!   "css": ""
//! }
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Workspace;
use crate::config::DEFAULT_CSS;
use crate::decks::sanitize_id;
use crate::error::{Error, Result};
use crate::structure::CardShape;

/// A built-in or custom template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredTemplate {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Card shape the template is written for.
    pub card_type: CardShape,
    /// Question format.
    pub qfmt: String,
    /// Answer format.
    pub afmt: String,
    /// Card CSS.
    pub css: String,
    /// Whether the template is built in.
    pub builtin: bool,
}

/// On-disk form of a custom template.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    card_type: CardShape,
    #[serde(default)]
    qfmt: String,
    #[serde(default)]
    afmt: String,
    #[serde(default)]
    css: String,
}

/// Parameters for a new custom template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    /// Display name; the identifier is derived from it.
    pub name: String,
    /// Card shape.
    pub card_type: CardShape,
    /// Question format.
    pub qfmt: String,
    /// Answer format.
    pub afmt: String,
    /// Card CSS.
    pub css: Option<String>,
}

/// The built-in templates.
pub fn builtin_templates() -> Vec<StoredTemplate> {
    let basic_afmt = "{{FrontSide}}<hr id=\"answer\"><div class=\"back\">{{Back}}</div>";
    vec![
        StoredTemplate {
            id: "basic".to_string(),
            name: "Basic Card".to_string(),
            card_type: CardShape::Basic,
            qfmt: "{{Front}}".to_string(),
            afmt: basic_afmt.to_string(),
            css: DEFAULT_CSS.to_string(),
            builtin: true,
        },
        StoredTemplate {
            id: "basic_reversed".to_string(),
            name: "Basic Card (with Reversed)".to_string(),
            card_type: CardShape::Basic,
            qfmt: "{{Front}}".to_string(),
            afmt: basic_afmt.to_string(),
            css: DEFAULT_CSS.to_string(),
            builtin: true,
        },
        StoredTemplate {
            id: "cloze".to_string(),
            name: "Cloze Deletion".to_string(),
            card_type: CardShape::Cloze,
            qfmt: "{{cloze:Text}}".to_string(),
            afmt: concat!(
                "{{cloze:Text}}<hr>",
                "<div class=\"extra\"><b>Translation:</b> {{Translation}}</div>",
                "<div class=\"extra\"><b>Explanation:</b> {{Explanation}}</div>",
            )
            .to_string(),
            css: DEFAULT_CSS.to_string(),
            builtin: true,
        },
    ]
}

/// Template store engine.
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    workspace: &'a Workspace,
}

impl<'a> TemplateEngine<'a> {
    pub(crate) fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Built-in templates followed by custom ones sorted by identifier.
    ///
    /// Custom files that cannot be parsed are skipped with a warning.
    pub fn list(&self) -> Result<Vec<StoredTemplate>> {
        let mut templates = builtin_templates();
        templates.extend(self.custom()?);
        Ok(templates)
    }

    /// Get a template by identifier.
    pub fn get(&self, id: &str) -> Result<StoredTemplate> {
        self.list()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("template '{}'", id)))
    }

    /// Store a new custom template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when the derived identifier is taken by a
    /// built-in or custom template, and [`Error::InvalidInput`] when a format
    /// string is empty.
    pub fn create(&self, new: &NewTemplate) -> Result<StoredTemplate> {
        for (key, value) in [("qfmt", &new.qfmt), ("afmt", &new.afmt)] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "template is missing required key '{}'",
                    key
                )));
            }
        }

        let id = sanitize_id(&new.name)?;
        let dir = &self.workspace.paths().templates_dir;
        let path = dir.join(format!("{id}.json"));
        if path.exists() || builtin_templates().iter().any(|t| t.id == id) {
            return Err(Error::Conflict(format!(
                "template '{}' already exists",
                new.name
            )));
        }

        let file = TemplateFile {
            name: Some(new.name.clone()),
            card_type: new.card_type,
            qfmt: new.qfmt.clone(),
            afmt: new.afmt.clone(),
            css: new.css.clone().unwrap_or_default(),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &file)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path)?;
        info!(template = %id, "Created template");

        Ok(stored(id, file))
    }

    fn custom(&self) -> Result<Vec<StoredTemplate>> {
        let dir = &self.workspace.paths().templates_dir;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut templates = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let parsed = std::fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|content| Ok(serde_json::from_str::<TemplateFile>(&content)?));
            match parsed {
                Ok(file) => templates.push(stored(id, file)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable template"),
            }
        }
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(templates)
    }
}

fn stored(id: String, file: TemplateFile) -> StoredTemplate {
    StoredTemplate {
        name: file.name.unwrap_or_else(|| id.clone()),
        id,
        card_type: file.card_type,
        qfmt: file.qfmt,
        afmt: file.afmt,
        css: file.css,
        builtin: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_template(name: &str) -> NewTemplate {
        NewTemplate {
            name: name.to_string(),
            card_type: CardShape::Basic,
            qfmt: "{{Infinitive}}".to_string(),
            afmt: "{{FrontSide}}<hr id=\"answer\">{{Conjugation}}".to_string(),
            css: None,
        }
    }

    #[test]
    fn test_builtins_listed_first() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        let ids: Vec<_> = workspace
            .templates()
            .list()
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["basic", "basic_reversed", "cloze"]);
    }

    #[test]
    fn test_create_and_get() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        let created = workspace.templates().create(&new_template("Verb Drill")).unwrap();
        assert_eq!(created.id, "verb_drill");
        assert!(!created.builtin);

        let fetched = workspace.templates().get("verb_drill").unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_create_conflicts() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        workspace.templates().create(&new_template("Verb Drill")).unwrap();

        let err = workspace.templates().create(&new_template("verb drill")).unwrap_err();
        assert!(err.is_conflict());
        let err = workspace.templates().create(&new_template("Cloze")).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_create_requires_formats() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        let mut template = new_template("Empty");
        template.afmt.clear();
        let err = workspace.templates().create(&template).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(!dir.path().join("templates").join("empty.json").exists());
    }

    #[test]
    fn test_unreadable_custom_template_is_skipped() {
        let dir = tempdir().unwrap();
        let templates_dir = dir.path().join("templates");
        std::fs::create_dir_all(&templates_dir).unwrap();
        std::fs::write(templates_dir.join("broken.json"), "{not json").unwrap();
        std::fs::write(
            templates_dir.join("plain.json"),
            r#"{"qfmt": "{{A}}", "afmt": "{{B}}"}"#,
        )
        .unwrap();

        let workspace = Workspace::open(dir.path()).unwrap();
        let templates = workspace.templates().list().unwrap();
        assert_eq!(templates.len(), 4);
        let plain = workspace.templates().get("plain").unwrap();
        assert_eq!(plain.name, "plain");
        assert_eq!(plain.card_type, CardShape::Basic);
        assert!(workspace.templates().get("broken").unwrap_err().is_not_found());
    }
}
