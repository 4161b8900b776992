//! Example: Build a cloze deck from TOML
//!
//! This example demonstrates how to use deckgen-builder to:
//! 1. Parse a TOML deck definition with a cloze note type
//! 2. Generate an .apkg file with one card per cloze number
//!
//! Run with: cargo run -p deckgen-builder --example build_deck

use deckgen_builder::DeckBuilder;
use deckgen_builder::cloze::cloze_ordinals;

const EXAMPLE_TOML: &str = r#"
[package]
name = "Spanish Ser Estar"
version = "1.0.0"
author = "Example Author"

[[models]]
name = "Spanish Ser Estar Model"
kind = "cloze"
fields = ["Text", "Translation", "Explanation"]

[[models.templates]]
name = "Cloze"
qfmt = "{{cloze:Text}}"
afmt = """
{{cloze:Text}}<hr>
<b>Translation:</b> {{Translation}}<br>
<b>Explanation:</b> {{Explanation}}<br>
"""

[[decks]]
name = "Spanish Ser Estar"
description = "Choosing between ser and estar"

[[notes]]
deck = "Spanish Ser Estar"
model = "Spanish Ser Estar Model"
tags = ["spanish", "ser-estar"]

[notes.fields]
Text = "Yo {{c1::soy}} médico."
Translation = "I am a doctor."
Explanation = "Profession uses ser."

[[notes]]
deck = "Spanish Ser Estar"
model = "Spanish Ser Estar Model"
tags = ["spanish", "ser-estar"]

[notes.fields]
Text = "Ella {{c1::está}} cansada y {{c2::es}} alta."
Translation = "She is tired and she is tall."
Explanation = "Temporary state uses estar, trait uses ser."
"#;

fn main() -> deckgen_builder::Result<()> {
    println!("Parsing TOML deck definition...");

    let builder = DeckBuilder::parse(EXAMPLE_TOML)?;
    let definition = builder.definition();

    println!("  Package: {}", definition.package.name);
    println!("  Models: {}", definition.models.len());
    println!("  Notes: {}", definition.notes.len());

    let cards: usize = definition
        .notes
        .iter()
        .map(|note| {
            let text = note.fields.get("Text").map(String::as_str).unwrap_or("");
            cloze_ordinals(text).len()
        })
        .sum();
    println!("  Cards: {}", cards);

    let output_path = std::env::temp_dir().join("spanish_ser_estar.apkg");
    println!("\nGenerating .apkg file: {}", output_path.display());

    builder.write_apkg(&output_path)?;

    let metadata = std::fs::metadata(&output_path)?;
    println!("  Created: {} bytes", metadata.len());

    Ok(())
}
