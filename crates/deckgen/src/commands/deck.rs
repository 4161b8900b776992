//! Deck management.

use clap::Subcommand;
use deckgen_engine::decks::{DeckFilter, NewDeck};
use deckgen_engine::{CardShape, Workspace};

use super::{CmdResult, Output, parse_shape, print_deck};

#[derive(Subcommand, Debug)]
pub enum DeckCommand {
    /// List decks, most recently modified first
    List {
        /// Only decks in this language
        #[arg(long)]
        language: Option<String>,

        /// Only decks carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one deck
    Show {
        /// Deck identifier
        id: String,
    },

    /// Create an empty deck
    Create {
        /// Display name; the identifier is derived from it
        name: String,

        /// Card type, which picks the default fields
        #[arg(long, default_value = "basic", value_parser = parse_shape)]
        card_type: CardShape,

        /// Explicit field names
        #[arg(long, num_args = 1..)]
        fields: Vec<String>,
    },

    /// Rename a deck
    Rename {
        /// Deck identifier
        id: String,

        /// New display name
        name: String,
    },

    /// Delete a deck and its package
    Delete {
        /// Deck identifier
        id: String,
    },

    /// Generate the package for a deck
    Build {
        /// Deck identifier
        id: String,
    },
}

pub fn run(workspace: &Workspace, cmd: DeckCommand, out: &Output) -> CmdResult {
    let decks = workspace.decks();
    match cmd {
        DeckCommand::List { language, tag } => {
            let list = decks.list(&DeckFilter { language, tag })?;
            out.emit(&list, |list| {
                for deck in list {
                    println!(
                        "{}\t{}\t{}\t{} cards",
                        deck.id, deck.name, deck.card_type, deck.card_count
                    );
                }
            })
        }
        DeckCommand::Show { id } => out.emit(&decks.get(&id)?, print_deck),
        DeckCommand::Create {
            name,
            card_type,
            fields,
        } => {
            let mut new = NewDeck::new(name, card_type);
            if !fields.is_empty() {
                new = new.fields(fields);
            }
            out.emit(&decks.create(&new)?, print_deck)
        }
        DeckCommand::Rename { id, name } => out.emit(&decks.rename(&id, &name)?, print_deck),
        DeckCommand::Delete { id } => {
            decks.delete(&id)?;
            println!("Deleted deck {id}");
            Ok(())
        }
        DeckCommand::Build { id } => out.emit(&decks.build(&id)?, print_deck),
    }
}
