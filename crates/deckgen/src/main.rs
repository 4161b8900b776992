//! Command-line flashcard deck generator.
//!
//! Turns the CSV and TSV tables of a workspace directory into Anki packages
//! and manages the tables as decks of cards.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use deckgen_engine::Workspace;
use tracing::debug;

use commands::{Output, card, deck, generate, import, tags, template};

// ============================================================================
// CLI Arguments
// ============================================================================

/// Generate Anki flashcard decks from CSV and TSV tables.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Workspace directory holding csv/, apkg/, media/, templates/ and config/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate packages from the tables under csv/
    Generate(generate::GenerateArgs),

    /// Inspect tags and configure custom tags
    #[command(subcommand)]
    Tags(tags::TagsCommand),

    /// Configure generated templates and manage stored ones
    #[command(subcommand)]
    Template(template::TemplateCommand),

    /// Show the generation history
    History,

    /// Manage decks
    #[command(subcommand)]
    Deck(deck::DeckCommand),

    /// Manage the cards of a deck
    #[command(subcommand)]
    Card(card::CardCommand),

    /// Create decks from table files or pasted text
    #[command(subcommand)]
    Import(import::ImportCommand),

    /// Write the deck definition assembled from a table as TOML
    Describe(generate::DescribeArgs),

    /// Package a TOML deck definition
    Build(generate::BuildArgs),
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    run(args)
}

fn run(args: Args) -> commands::CmdResult {
    let mut workspace = Workspace::open(&args.root)?;
    debug!(root = %args.root.display(), "Opened workspace");
    let out = Output::new(args.json);

    match args.command {
        Command::Generate(cmd) => generate::run(&mut workspace, cmd, &out),
        Command::Tags(cmd) => tags::run(&mut workspace, cmd, &out),
        Command::Template(cmd) => template::run(&mut workspace, cmd, &out),
        Command::History => generate::history(&workspace, &out),
        Command::Deck(cmd) => deck::run(&workspace, cmd, &out),
        Command::Card(cmd) => card::run(&workspace, cmd, &out),
        Command::Import(cmd) => import::run(&workspace, cmd, &out),
        Command::Describe(cmd) => generate::describe(&workspace, cmd, &out),
        Command::Build(cmd) => generate::build(cmd, &out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    fn run_in(root: &std::path::Path, command: &[&str]) -> commands::CmdResult {
        let root = root.to_string_lossy().into_owned();
        let mut argv = vec!["deckgen", "--root", root.as_str()];
        argv.extend_from_slice(command);
        run(Args::try_parse_from(argv)?)
    }

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let args = Args::try_parse_from([
            "deckgen",
            "--root",
            "/tmp/decks",
            "generate",
            "--language",
            "French",
            "--files",
            "a.csv",
            "b.csv",
            "--merge",
            "--merge-name",
            "All",
        ])
        .unwrap();
        assert_eq!(args.root, PathBuf::from("/tmp/decks"));
        let Command::Generate(cmd) = args.command else {
            panic!("expected generate");
        };
        assert_eq!(cmd.language, "french");
        assert_eq!(cmd.files, ["a.csv", "b.csv"]);
        assert_eq!(cmd.merge_name.as_deref(), Some("All"));
    }

    #[test]
    fn test_merge_requires_name() {
        assert!(Args::try_parse_from(["deckgen", "generate", "--merge"]).is_err());
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(Args::try_parse_from(["deckgen", "generate", "--language", "klingon"]).is_err());
    }

    #[test]
    fn test_parse_card_fields() {
        let args = Args::try_parse_from([
            "deckgen",
            "-vv",
            "card",
            "add",
            "verbs",
            "--field",
            "Front=ser",
            "--field",
            "Back=to be",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let Command::Card(card::CardCommand::Add { deck, fields, .. }) = args.command else {
            panic!("expected card add");
        };
        assert_eq!(deck, "verbs");
        assert_eq!(
            fields,
            [
                ("Front".to_string(), "ser".to_string()),
                ("Back".to_string(), "to be".to_string())
            ]
        );
    }

    #[test]
    fn test_commands_against_workspace() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        run_in(root, &["deck", "create", "Spanish Food"]).unwrap();
        run_in(
            root,
            &["card", "add", "spanish_food", "--field", "Front=uno", "--field", "Back=one"],
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(root.join("csv/spanish_food.csv")).unwrap(),
            "Front,Back\nuno,one\n"
        );

        run_in(root, &["generate", "--merge", "--merge-name", "All"]).unwrap();
        assert!(root.join("apkg/spanish_food.apkg").is_file());
        assert!(root.join("apkg/All.apkg").is_file());

        assert!(run_in(root, &["generate", "--merge", "--merge-name", "../All"]).is_err());
        assert!(!root.join("All.apkg").exists());
        assert!(run_in(root, &["deck", "show", "missing"]).is_err());
    }
}
