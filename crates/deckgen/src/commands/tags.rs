//! Tag inspection and custom tag configuration.

use std::path::PathBuf;

use clap::Subcommand;
use deckgen_engine::Workspace;
use serde::Serialize;
use tracing::warn;

use super::{CmdResult, Output, parse_language};

#[derive(Subcommand, Debug)]
pub enum TagsCommand {
    /// Show the tags tables would be generated with
    Show {
        /// Table file names under csv/, or paths
        #[arg(required = true)]
        files: Vec<String>,

        /// Language of the decks
        #[arg(long, default_value = "spanish", value_parser = parse_language)]
        language: String,
    },

    /// Add tags for every table whose file name contains a pattern
    Add {
        /// Substring of the file name
        #[arg(long)]
        pattern: String,

        /// Tags to add
        #[arg(long, required = true, num_args = 1..)]
        tags: Vec<String>,
    },

    /// List every tag carried by some deck
    List,

    /// Suggest category tags for free text
    Suggest {
        /// Text to match, such as a file name or card content
        text: String,
    },
}

#[derive(Debug, Serialize)]
struct ShownTags {
    file: String,
    tags: Vec<String>,
}

pub fn run(workspace: &mut Workspace, cmd: TagsCommand, out: &Output) -> CmdResult {
    match cmd {
        TagsCommand::Show { files, language } => {
            let mut shown = Vec::new();
            for file in files {
                let path = resolve_table(workspace, &file);
                if !path.is_file() {
                    warn!(file = %path.display(), "File not found");
                    continue;
                }
                let tags = workspace.tags().show(&path, &language)?;
                shown.push(ShownTags { file, tags });
            }
            out.emit(&shown, |shown| {
                for entry in shown {
                    println!("Tags for {}:", entry.file);
                    println!("  {}", entry.tags.join(", "));
                }
            })
        }
        TagsCommand::Add { pattern, tags } => {
            workspace.config_mut().add_custom_tags(&pattern, tags.clone())?;
            workspace.save_config()?;
            out.emit(&tags, |tags| {
                println!("Added custom tags {:?} for pattern '{}'", tags, pattern);
            })
        }
        TagsCommand::List => {
            let tags = workspace.tags().list()?;
            out.emit(&tags, |tags| {
                for tag in tags {
                    println!("{tag}");
                }
            })
        }
        TagsCommand::Suggest { text } => {
            let suggestions = workspace.tags().suggest(&text);
            out.emit(&suggestions, |suggestions| {
                if suggestions.is_empty() {
                    println!("No suggestions.");
                }
                for s in suggestions {
                    println!("{} ({})", s.tag, s.count);
                }
            })
        }
    }
}

/// A bare file name refers to `csv/`; anything else is used as given.
fn resolve_table(workspace: &Workspace, file: &str) -> PathBuf {
    let given = PathBuf::from(file);
    if given.components().count() == 1 && !given.is_file() {
        workspace.paths().csv_dir.join(given)
    } else {
        given
    }
}
