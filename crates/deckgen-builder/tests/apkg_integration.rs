//! Integration tests for .apkg generation.
//!
//! These tests build actual .apkg files and verify their contents
//! by inspecting the SQLite database and ZIP structure.

use std::collections::HashMap;
use std::io::Read;

use deckgen_builder::ids::stable_id;
use deckgen_builder::{DeckBuilder, DeckDefinition};
use rusqlite::Connection;
use tempfile::{TempDir, tempdir};
use zip::ZipArchive;

/// Extract the collection from an .apkg file and open it.
///
/// The returned directory must outlive the connection.
fn open_apkg_database(apkg_path: &std::path::Path) -> (TempDir, Connection) {
    let file = std::fs::File::open(apkg_path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();

    let mut db_file = archive.by_name("collection.anki2").unwrap();
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("collection.anki2");
    let mut db_bytes = Vec::new();
    db_file.read_to_end(&mut db_bytes).unwrap();
    std::fs::write(&db_path, &db_bytes).unwrap();

    let conn = Connection::open(&db_path).unwrap();
    (temp_dir, conn)
}

fn get_media_manifest(apkg_path: &std::path::Path) -> HashMap<String, String> {
    let file = std::fs::File::open(apkg_path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();

    let mut media_file = archive.by_name("media").unwrap();
    let mut content = String::new();
    media_file.read_to_string(&mut content).unwrap();

    serde_json::from_str(&content).unwrap()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

const BASIC_TOML: &str = r#"
[package]
name = "Test Package"

[[models]]
name = "Basic"
fields = ["Front", "Back"]

[[models.templates]]
name = "Card 1"
qfmt = "{{Front}}"
afmt = "{{FrontSide}}<hr>{{Back}}"

[[models.templates]]
name = "Card 1 (Reversed)"
qfmt = "{{Back}}"
afmt = "{{FrontSide}}<hr>{{Front}}"

[[decks]]
name = "Test Deck"
id = 12345

[[notes]]
deck = "Test Deck"
model = "Basic"
tags = ["test", "example"]

[notes.fields]
Front = "What is 2+2?"
Back = "4"

[[notes]]
deck = "Test Deck"
model = "Basic"

[notes.fields]
Front = "Capital of France?"
Back = "Paris"
"#;

const CLOZE_TOML: &str = r#"
[package]
name = "Cloze Package"

[[models]]
name = "Spanish Cloze Model"
kind = "cloze"
fields = ["Text", "Translation"]

[[models.templates]]
name = "Cloze Card"
qfmt = "{{cloze:Text}}"
afmt = "{{cloze:Text}}<hr>{{Translation}}"

[[decks]]
name = "Spanish Cloze"

[[notes]]
deck = "Spanish Cloze"
model = "Spanish Cloze Model"

[notes.fields]
Text = "Yo {{c1::soy}} de {{c2::Madrid}}."
Translation = "I am from Madrid."

[[notes]]
deck = "Spanish Cloze"
model = "Spanish Cloze Model"

[notes.fields]
Text = "Ella {{c1::es}} alta."
Translation = "She is tall."
"#;

#[test]
fn test_apkg_contains_expected_files() {
    let builder = DeckBuilder::parse(BASIC_TOML).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.apkg");

    builder.write_apkg(&path).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let archive = ZipArchive::new(file).unwrap();
    let names: Vec<_> = archive.file_names().collect();
    assert!(names.contains(&"collection.anki2"), "Missing collection.anki2");
    assert!(names.contains(&"media"), "Missing media manifest");
}

#[test]
fn test_apkg_basic_counts() {
    let builder = DeckBuilder::parse(BASIC_TOML).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.apkg");
    builder.write_apkg(&path).unwrap();

    let (_dir, conn) = open_apkg_database(&path);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM notes"), 2);
    // 2 notes * 2 templates
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM cards"), 4);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM cards WHERE did = 12345"), 4);
}

#[test]
fn test_apkg_cloze_cards_follow_ordinals() {
    let builder = DeckBuilder::parse(CLOZE_TOML).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("cloze.apkg");
    builder.write_apkg(&path).unwrap();

    let (_dir, conn) = open_apkg_database(&path);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM notes"), 2);
    // c1 + c2 for the first note, c1 for the second
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM cards"), 3);
    assert_eq!(count(&conn, "SELECT MAX(ord) FROM cards"), 1);

    let models_json: String = conn
        .query_row("SELECT models FROM col", [], |row| row.get(0))
        .unwrap();
    let models: serde_json::Value = serde_json::from_str(&models_json).unwrap();
    let model = &models[stable_id("Spanish Cloze Model").to_string()];
    assert_eq!(model["type"], 1);
    assert_eq!(model["tmpls"][0]["qfmt"], "{{cloze:Text}}");
}

#[test]
fn test_apkg_note_fields_and_tags() {
    let builder = DeckBuilder::parse(BASIC_TOML).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.apkg");
    builder.write_apkg(&path).unwrap();

    let (_dir, conn) = open_apkg_database(&path);
    let rows: Vec<(String, String)> = conn
        .prepare("SELECT flds, tags FROM notes ORDER BY id")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(rows[0].0, "What is 2+2?\x1f4");
    assert_eq!(rows[0].1, " test example ");
    assert_eq!(rows[1].0, "Capital of France?\x1fParis");
    assert!(rows[1].1.trim().is_empty());
}

#[test]
fn test_apkg_deck_ids_are_stable() {
    let def = DeckDefinition::parse(CLOZE_TOML).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("cloze.apkg");
    DeckBuilder::new(def).write_apkg(&path).unwrap();

    let (_dir, conn) = open_apkg_database(&path);
    let decks_json: String = conn
        .query_row("SELECT decks FROM col", [], |row| row.get(0))
        .unwrap();
    let decks: serde_json::Value = serde_json::from_str(&decks_json).unwrap();

    assert_eq!(decks["1"]["name"], "Default");
    assert_eq!(
        decks[stable_id("Spanish Cloze").to_string()]["name"],
        "Spanish Cloze"
    );
}

#[test]
fn test_apkg_empty_media_manifest() {
    let builder = DeckBuilder::parse(BASIC_TOML).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.apkg");
    builder.write_apkg(&path).unwrap();

    assert!(get_media_manifest(&path).is_empty());
}

#[test]
fn test_apkg_with_media_base_path() {
    let dir = tempdir().unwrap();
    let media_dir = dir.path().join("media");
    std::fs::create_dir(&media_dir).unwrap();
    std::fs::write(media_dir.join("cat.png"), b"not really a png").unwrap();

    let toml = format!(
        "{}\n[[media]]\nname = \"cat.png\"\npath = \"cat.png\"\n",
        BASIC_TOML
    );
    let builder = DeckBuilder::parse(&toml)
        .unwrap()
        .media_base_path(&media_dir);
    let path = dir.path().join("media.apkg");
    builder.write_apkg(&path).unwrap();

    let manifest = get_media_manifest(&path);
    assert_eq!(manifest.get("0").map(String::as_str), Some("cat.png"));

    let file = std::fs::File::open(&path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name("0").unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, b"not really a png");
}

#[test]
fn test_apkg_merged_definitions() {
    let basic = DeckDefinition::parse(BASIC_TOML).unwrap();
    let cloze = DeckDefinition::parse(CLOZE_TOML).unwrap();
    let merged = DeckDefinition::merged("Everything", 777, &[basic, cloze]);

    let dir = tempdir().unwrap();
    let path = dir.path().join("everything.apkg");
    DeckBuilder::new(merged).write_apkg(&path).unwrap();

    let (_dir, conn) = open_apkg_database(&path);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM notes"), 4);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM cards"), 7);
    assert_eq!(count(&conn, "SELECT COUNT(DISTINCT did) FROM cards"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(DISTINCT mid) FROM notes"), 2);
}
