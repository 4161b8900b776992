//! Card management within a deck.

use std::collections::HashMap;

use clap::Subcommand;
use deckgen_engine::Workspace;
use deckgen_engine::cards::{Card, NewCard};

use super::{CmdResult, Output, parse_field};

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// List the cards of a deck
    List {
        /// Deck identifier
        deck: String,
    },

    /// Show one card
    Show {
        /// Deck identifier
        deck: String,

        /// Card position, starting at 0
        index: usize,
    },

    /// Append a card
    Add {
        /// Deck identifier
        deck: String,

        /// Field value as NAME=VALUE (repeatable)
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,

        /// Extra tag for the printed card (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Change field values of a card
    Update {
        /// Deck identifier
        deck: String,

        /// Card position, starting at 0
        index: usize,

        /// Field value as NAME=VALUE (repeatable)
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Delete a card; later cards move down by one
    Delete {
        /// Deck identifier
        deck: String,

        /// Card position, starting at 0
        index: usize,
    },
}

pub fn run(workspace: &Workspace, cmd: CardCommand, out: &Output) -> CmdResult {
    let cards = workspace.cards();
    match cmd {
        CardCommand::List { deck } => {
            let list = cards.list(&deck)?;
            let columns = workspace.decks().get(&deck)?.fields;
            out.emit(&list, |list| {
                for card in list {
                    let values: Vec<&str> = columns
                        .iter()
                        .map(|c| card.fields.get(c).map(String::as_str).unwrap_or(""))
                        .collect();
                    println!("{}\t{}", card.id, values.join("\t"));
                }
            })
        }
        CardCommand::Show { deck, index } => out.emit(&cards.get(&deck, index)?, print_card),
        CardCommand::Add { deck, fields, tags } => {
            let new = NewCard::new(fields.into_iter().collect()).tags(tags);
            out.emit(&cards.create(&deck, new)?, print_card)
        }
        CardCommand::Update {
            deck,
            index,
            fields,
        } => {
            let fields: HashMap<String, String> = fields.into_iter().collect();
            out.emit(&cards.update(&deck, index, &fields)?, print_card)
        }
        CardCommand::Delete { deck, index } => {
            cards.delete(&deck, index)?;
            println!("Deleted card {index} from {deck}");
            Ok(())
        }
    }
}

fn print_card(card: &Card) {
    println!("Card {} in {}", card.id, card.deck_id);
    let mut names: Vec<&String> = card.fields.keys().collect();
    names.sort();
    for name in names {
        println!("  {}: {}", name, card.fields[name]);
    }
    println!("  Tags: {}", card.tags.join(", "));
}
