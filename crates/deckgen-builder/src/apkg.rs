//! .apkg file generation.
//!
//! An `.apkg` is a ZIP archive holding a SQLite collection
//! (`collection.anki2`), a `media` manifest mapping numeric entry names to
//! file names, and the media files themselves under those numeric names.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use serde_json::{Value, json};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::cloze::cloze_ordinals;
use crate::error::{Error, Result};
use crate::ids::stable_id;
use crate::schema::{DeckDefinition, ModelDef, ModelKind, TemplateDef};
use crate::sql::{FIELD_SEPARATOR, SCHEMA};

/// Builder for creating .apkg files from deck definitions.
pub struct ApkgBuilder {
    definition: DeckDefinition,
    media_base_path: Option<PathBuf>,
}

impl ApkgBuilder {
    /// Create a new builder from a deck definition.
    pub fn new(definition: DeckDefinition) -> Self {
        Self {
            definition,
            media_base_path: None,
        }
    }

    /// Set the base path for resolving relative media file paths.
    pub fn media_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.media_base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the .apkg file and write it to the specified path.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.definition.validate()?;

        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("collection.anki2");

        {
            let conn = Connection::open(&db_path)?;
            self.create_database(&conn)?;
        }

        let file = std::fs::File::create(path)?;
        let mut zip = ZipWriter::new(file);

        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("collection.anki2", options)?;
        let db_bytes = std::fs::read(&db_path)?;
        zip.write_all(&db_bytes)?;

        zip.start_file("media", options)?;
        zip.write_all(self.build_media_manifest()?.as_bytes())?;

        for (index, media) in self.definition.media.iter().enumerate() {
            let source_path = self.resolve_media_path(&media.path);
            let content = std::fs::read(&source_path)
                .map_err(|_| Error::MediaNotFound(source_path.display().to_string()))?;
            zip.start_file(index.to_string(), options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Create the SQLite database with all content.
    fn create_database(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;

        let now = current_timestamp();
        let now_ms = now * 1000;

        let models_json = self.build_models_json(now)?;
        let decks_json = self.build_decks_json(now)?;
        let conf_json = serde_json::to_string(&collection_conf())?;
        let dconf_json = serde_json::to_string(&deck_conf())?;

        conn.execute(
            "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
             VALUES (1, ?, ?, ?, 11, 0, -1, 0, ?, ?, ?, ?, '{}')",
            rusqlite::params![now, now_ms, now_ms, conf_json, models_json, decks_json, dconf_json],
        )?;

        let mut note_id_gen = now_ms;
        let mut card_id_gen = now_ms;
        let mut due = 1_i64;

        for note_def in &self.definition.notes {
            let model = self
                .definition
                .get_model(&note_def.model)
                .ok_or_else(|| Error::ModelNotFound(note_def.model.clone()))?;
            let deck = self
                .definition
                .get_deck(&note_def.deck)
                .ok_or_else(|| Error::DeckNotFound(note_def.deck.clone()))?;
            let deck_id = deck.id.unwrap_or_else(|| stable_id(&deck.name));
            let model_id = model_id(model);

            let note_id = note_id_gen;
            note_id_gen += 1;

            let guid = note_def
                .guid
                .clone()
                .unwrap_or_else(|| generate_guid(note_id));

            let values = note_def.fields_ordered(model);
            let fields_str = values.join(&FIELD_SEPARATOR.to_string());
            let sort_field = values
                .get(model.sort_field_index())
                .cloned()
                .unwrap_or_default();
            let checksum = compute_checksum(&sort_field);

            conn.execute(
                "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
                 VALUES (?, ?, ?, ?, -1, ?, ?, ?, ?, 0, '')",
                rusqlite::params![
                    note_id,
                    guid,
                    model_id,
                    now,
                    note_def.tags_string(),
                    fields_str,
                    strip_html(&sort_field),
                    checksum
                ],
            )?;

            let ordinals: Vec<u32> = match model.kind {
                ModelKind::Standard => (0..model.templates.len() as u32).collect(),
                ModelKind::Cloze => {
                    cloze_ordinals(values.first().map(String::as_str).unwrap_or(""))
                }
            };

            for ord in ordinals {
                let card_id = card_id_gen;
                card_id_gen += 1;

                conn.execute(
                    "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
                     VALUES (?, ?, ?, ?, ?, -1, 0, 0, ?, 0, 0, 0, 0, 0, 0, 0, 0, '')",
                    rusqlite::params![card_id, note_id, deck_id, ord, now, due],
                )?;
            }
            due += 1;
        }

        Ok(())
    }

    /// Build the models JSON for the col table.
    fn build_models_json(&self, now: i64) -> Result<String> {
        let mut models: HashMap<String, Value> = HashMap::new();

        for model in &self.definition.models {
            let model_id = model_id(model);

            let fields: Vec<Value> = model
                .fields
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    json!({
                        "name": name,
                        "ord": i,
                        "sticky": false,
                        "rtl": false,
                        "font": "Arial",
                        "size": 20,
                        "media": []
                    })
                })
                .collect();

            let templates: Vec<Value> = model
                .templates
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    json!({
                        "name": t.name,
                        "ord": i,
                        "qfmt": t.qfmt,
                        "afmt": t.afmt,
                        "bqfmt": "",
                        "bafmt": "",
                        "did": null,
                        "bfont": "",
                        "bsize": 0
                    })
                })
                .collect();

            let (kind, req) = match model.kind {
                ModelKind::Standard => (0, build_requirements(&model.templates, &model.fields)),
                ModelKind::Cloze => (1, Vec::new()),
            };

            let model_obj = json!({
                "id": model_id,
                "name": model.name,
                "type": kind,
                "mod": now,
                "usn": -1,
                "sortf": model.sort_field_index(),
                "did": null,
                "tmpls": templates,
                "flds": fields,
                "css": model.css.clone().unwrap_or_else(default_css),
                "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
                "latexPost": "\\end{document}",
                "latexsvg": false,
                "req": req
            });

            models.insert(model_id.to_string(), model_obj);
        }

        Ok(serde_json::to_string(&models)?)
    }

    /// Build the decks JSON for the col table.
    fn build_decks_json(&self, now: i64) -> Result<String> {
        let mut decks: HashMap<String, Value> = HashMap::new();

        // the collection must always contain the Default deck
        decks.insert("1".to_string(), deck_json(1, "Default", "", now));

        for deck in &self.definition.decks {
            let deck_id = deck.id.unwrap_or_else(|| stable_id(&deck.name));
            let desc = deck.description.clone().unwrap_or_default();
            decks.insert(deck_id.to_string(), deck_json(deck_id, &deck.name, &desc, now));
        }

        Ok(serde_json::to_string(&decks)?)
    }

    /// Build the media manifest JSON.
    fn build_media_manifest(&self) -> Result<String> {
        let manifest: HashMap<String, &str> = self
            .definition
            .media
            .iter()
            .enumerate()
            .map(|(i, m)| (i.to_string(), m.name.as_str()))
            .collect();

        Ok(serde_json::to_string(&manifest)?)
    }

    fn resolve_media_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match self.media_base_path {
            Some(ref base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn model_id(model: &ModelDef) -> i64 {
    model.id.unwrap_or_else(|| stable_id(&model.name))
}

fn deck_json(id: i64, name: &str, desc: &str, now: i64) -> Value {
    json!({
        "id": id,
        "mod": now,
        "name": name,
        "usn": -1,
        "lrnToday": [0, 0],
        "revToday": [0, 0],
        "newToday": [0, 0],
        "timeToday": [0, 0],
        "collapsed": false,
        "browserCollapsed": false,
        "desc": desc,
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50
    })
}

fn collection_conf() -> Value {
    json!({
        "activeDecks": [1],
        "curDeck": 1,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "curModel": null,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true
    })
}

fn deck_conf() -> Value {
    json!({
        "1": {
            "id": 1,
            "mod": 0,
            "name": "Default",
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "timer": 0,
            "replayq": true,
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "perDay": 100,
                "hardFactor": 1.2
            },
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0
            },
            "dyn": false
        }
    })
}

/// Get current Unix timestamp in seconds.
fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Generate a GUID for a note.
fn generate_guid(note_id: i64) -> String {
    // Base91 encoding similar to Anki
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+,-./:;<=>?@[]^_`{|}~";
    let mut n = note_id as u64;
    let mut result = String::new();
    while n > 0 {
        result.push(CHARS[(n % 91) as usize] as char);
        n /= 91;
    }
    result
}

/// Checksum of the sort field with HTML removed.
fn compute_checksum(sort_field: &str) -> i64 {
    (crate::ids::fnv1a(&strip_html(sort_field)) & 0xFFFF_FFFF) as i64
}

/// Simple HTML stripping.
fn strip_html(s: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Which fields must be non-empty for each template to produce a card.
fn build_requirements(templates: &[TemplateDef], fields: &[String]) -> Vec<Value> {
    templates
        .iter()
        .enumerate()
        .map(|(ord, template)| {
            let referenced: Vec<usize> = fields
                .iter()
                .enumerate()
                .filter(|(_, f)| template.qfmt.contains(&format!("{{{{{}}}}}", f)))
                .map(|(i, _)| i)
                .collect();

            if referenced.is_empty() {
                json!([ord, "any", [0]])
            } else {
                json!([ord, "any", referenced])
            }
        })
        .collect()
}

/// Default CSS for cards.
fn default_css() -> String {
    r#".card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_guid() {
        let guid = generate_guid(1234567890);
        assert!(!guid.is_empty());
        assert_eq!(guid, generate_guid(1234567890));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>Hello</b> World"), "Hello World");
        assert_eq!(strip_html("No HTML"), "No HTML");
        assert_eq!(strip_html("<div><p>Nested</p></div>"), "Nested");
    }

    #[test]
    fn test_requirements_follow_question_fields() {
        let templates = vec![
            TemplateDef {
                name: "Card 1".to_string(),
                qfmt: "{{Front}}".to_string(),
                afmt: "{{FrontSide}}".to_string(),
            },
            TemplateDef {
                name: "Card 1 (Reversed)".to_string(),
                qfmt: "{{Back}}".to_string(),
                afmt: "{{FrontSide}}".to_string(),
            },
        ];
        let fields = vec!["Front".to_string(), "Back".to_string()];
        let req = build_requirements(&templates, &fields);
        assert_eq!(req[0], json!([0, "any", [0]]));
        assert_eq!(req[1], json!([1, "any", [1]]));
    }

    #[test]
    fn test_missing_media_is_reported() {
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

[[media]]
name = "missing.png"
path = "does/not/exist.png"
"#;

        let def = DeckDefinition::parse(toml).unwrap();
        let dir = tempdir().unwrap();
        let result = ApkgBuilder::new(def).write_to_file(dir.path().join("test.apkg"));
        assert!(matches!(result, Err(Error::MediaNotFound(_))));
    }
}
