//! Demonstrates the main workflows provided by deckgen-engine.
//!
//! Run with: `cargo run -p deckgen-engine --example workspace_demo`
//!
//! A throwaway workspace is created in the system temp directory, filled
//! with two tables, and turned into packages.

use deckgen_engine::Workspace;
use deckgen_engine::generate::BatchOptions;
use deckgen_engine::paste::PasteOptions;

fn main() -> deckgen_engine::Result<()> {
    let root = std::env::temp_dir().join("deckgen-demo");
    let workspace = Workspace::open(&root)?;
    workspace.paths().ensure_dirs()?;

    std::fs::write(
        workspace.paths().deck_table("spanish_food_vocab"),
        "English,Spanish\napple,manzana\nbread,pan\ncheese,queso\n",
    )?;
    if workspace.decks().get("french_present_tense").is_err() {
        let options = PasteOptions {
            language: "french".to_string(),
            ..Default::default()
        };
        workspace.import().text(
            "Je {{c1::suis}} ici\tI am here\nNous {{c1::avons}} faim\tWe are hungry",
            "French Present Tense",
            &options,
        )?;
    }

    println!("Decks in {}:", root.display());
    for deck in workspace.decks().list(&Default::default())? {
        println!(
            "  - {} ({}, {} cards): {}",
            deck.name,
            deck.card_type,
            deck.card_count,
            deck.tags.join(", ")
        );
    }

    let options = BatchOptions {
        merge_name: Some("Everything".to_string()),
        ..Default::default()
    };
    let report = workspace.generate().directory(&options)?;
    println!("\nGenerated {} packages:", report.generated.len());
    for generated in &report.generated {
        println!("  - {}", generated.output_path.display());
    }
    for failure in &report.failures {
        println!("  ! {}: {}", failure.file.display(), failure.error);
    }
    if let Some(merged) = report.merged {
        println!("Merged package: {}", merged.display());
    }

    Ok(())
}
