//! Deck imports from table files and pasted text.

use std::path::PathBuf;

use clap::Subcommand;
use deckgen_engine::paste::{ColumnPreset, DEFAULT_SEPARATOR, PasteOptions};
use deckgen_engine::{CardShape, Workspace};

use super::{CmdResult, Output, parse_language, parse_shape, print_deck};

#[derive(Subcommand, Debug)]
pub enum ImportCommand {
    /// Import a CSV or TSV file as a new deck
    Csv {
        /// File to import
        file: PathBuf,

        /// Deck name (default: the file name)
        #[arg(long)]
        deck_name: Option<String>,
    },

    /// Import separated text as a new deck (`-` reads standard input)
    Text {
        /// File holding the text
        file: PathBuf,

        /// Deck name
        #[arg(long)]
        deck_name: String,

        /// Value separator (`\t` for tab)
        #[arg(long, default_value = DEFAULT_SEPARATOR)]
        separator: String,

        /// Column preset for text without a header line
        #[arg(long, value_parser = parse_preset)]
        preset: Option<ColumnPreset>,

        /// Card type used to pick a preset
        #[arg(long, value_parser = parse_shape)]
        card_type: Option<CardShape>,

        /// Language of the deck
        #[arg(long, default_value = "spanish", value_parser = parse_language)]
        language: String,
    },
}

pub fn run(workspace: &Workspace, cmd: ImportCommand, out: &Output) -> CmdResult {
    let deck = match cmd {
        ImportCommand::Csv { file, deck_name } => {
            workspace.import().csv(&file, deck_name.as_deref())?
        }
        ImportCommand::Text {
            file,
            deck_name,
            separator,
            preset,
            card_type,
            language,
        } => {
            let text = if file.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&file)?
            };
            let options = PasteOptions {
                separator: unescape_separator(&separator),
                preset,
                shape: card_type,
                language,
            };
            workspace.import().text(&text, &deck_name, &options)?
        }
    };
    out.emit(&deck, print_deck)
}

fn parse_preset(s: &str) -> Result<ColumnPreset, String> {
    s.parse().map_err(|e: deckgen_engine::Error| e.to_string())
}

fn unescape_separator(separator: &str) -> String {
    match separator {
        "\\t" => "\t".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_separator() {
        assert_eq!(unescape_separator("\\t"), "\t");
        assert_eq!(unescape_separator("|"), "|");
        assert_eq!(unescape_separator(";"), ";");
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!(parse_preset("vocab").unwrap(), ColumnPreset::Vocabulary);
        assert!(parse_preset("grid").is_err());
    }
}
