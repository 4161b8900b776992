//! Subcommand implementations.
//!
//! Each module defines the arguments of one command group and a `run`
//! function that calls into the engine and prints the result.

pub mod card;
pub mod deck;
pub mod generate;
pub mod import;
pub mod tags;
pub mod template;

use deckgen_engine::CardShape;
use deckgen_engine::assemble::{GENERIC_LANGUAGE, SUPPORTED_LANGUAGES};
use deckgen_engine::decks::Deck;
use serde::Serialize;

/// Result of a command.
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// How command results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as pretty JSON, or hand it to `human` for plain output.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T, human: impl FnOnce(&T)) -> CmdResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

/// Parse a `KEY=VALUE` argument.
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a language name, accepting the supported languages and `generic`.
pub fn parse_language(s: &str) -> Result<String, String> {
    let language = s.trim().to_lowercase();
    if language == GENERIC_LANGUAGE || SUPPORTED_LANGUAGES.contains(&language.as_str()) {
        Ok(language)
    } else {
        Err(format!(
            "unknown language '{}' (expected one of {}, {})",
            s,
            SUPPORTED_LANGUAGES.join(", "),
            GENERIC_LANGUAGE
        ))
    }
}

/// Parse a card shape name.
pub fn parse_shape(s: &str) -> Result<CardShape, String> {
    s.parse().map_err(|e: deckgen_engine::Error| e.to_string())
}

fn print_deck(deck: &Deck) {
    println!("{} ({})", deck.name, deck.id);
    println!("  Language: {}", deck.language);
    println!("  Card type: {}", deck.card_type);
    println!("  Fields: {}", deck.fields.join(", "));
    println!("  Cards: {}", deck.card_count);
    println!("  Tags: {}", deck.tags.join(", "));
    if let Some(package) = &deck.apkg_path {
        println!("  Package: {}", package.display());
    }
}
