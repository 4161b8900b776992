//! Package generation, history, and TOML definitions.

use std::path::PathBuf;

use clap::Args;
use deckgen_builder::DeckBuilder;
use deckgen_engine::Workspace;
use deckgen_engine::generate::{BatchOptions, BatchReport};
use tracing::info;

use super::{CmdResult, Output, parse_language};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Language of the generated decks
    #[arg(long, default_value = "spanish", value_parser = parse_language)]
    pub language: String,

    /// Table file names under csv/ to process (default: all)
    #[arg(long, num_args = 1..)]
    pub files: Vec<String>,

    /// Also merge every generated deck into one package
    #[arg(long, requires = "merge_name")]
    pub merge: bool,

    /// Name of the merged deck
    #[arg(long)]
    pub merge_name: Option<String>,

    /// Create reversed cards for basic decks
    #[arg(long)]
    pub reversed: bool,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Table to describe
    pub csv: PathBuf,

    /// Language of the deck
    #[arg(long, default_value = "spanish", value_parser = parse_language)]
    pub language: String,

    /// Write the definition to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// TOML deck definition
    pub definition: PathBuf,

    /// Package to write (default: the definition path with .apkg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory that relative media paths are resolved against
    #[arg(long)]
    pub media_dir: Option<PathBuf>,
}

pub fn run(workspace: &mut Workspace, args: GenerateArgs, out: &Output) -> CmdResult {
    if args.reversed {
        workspace.config_mut().create_reversed = true;
    }

    let options = BatchOptions {
        language: args.language,
        files: args.files,
        merge_name: if args.merge { args.merge_name } else { None },
    };
    info!(dir = %workspace.paths().csv_dir.display(), "Scanning for tables");
    let report = workspace.generate().directory(&options)?;

    out.emit(&report, print_report)?;
    if !report.failures.is_empty() {
        return Err(format!("{} table(s) failed", report.failures.len()).into());
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    if report.generated.is_empty() {
        println!("No decks were generated.");
    } else {
        println!("Generated {} deck(s):", report.generated.len());
        for generated in &report.generated {
            println!(
                "  - {} ({} notes): {}",
                generated.output_path.display(),
                generated.notes,
                generated.tags.join(", ")
            );
        }
    }
    if let Some(merged) = &report.merged {
        println!("Merged deck: {}", merged.display());
    }
    for failure in &report.failures {
        println!("Failed: {}: {}", failure.file.display(), failure.error);
    }
}

pub fn history(workspace: &Workspace, out: &Output) -> CmdResult {
    let entries = workspace.history().load()?;
    out.emit(&entries, |entries| {
        if entries.is_empty() {
            println!("No generation history found.");
            return;
        }
        println!("Generation history ({} entries):", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            println!("\n{}. {} -> {}", i + 1, entry.csv_file, entry.output_file);
            println!("   Generated: {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"));
            println!("   Tags: {}", entry.tags.join(", "));
        }
    })
}

pub fn describe(workspace: &Workspace, args: DescribeArgs, out: &Output) -> CmdResult {
    let (descriptor, definition) = workspace
        .generate()
        .definition(&args.csv, &args.language)?;

    match args.output {
        Some(path) => {
            definition.write_toml(&path)?;
            out.emit(&descriptor, |d| {
                println!(
                    "Wrote {} ({} notes) to {}",
                    d.name,
                    definition.notes.len(),
                    path.display()
                );
            })
        }
        None => {
            print!("{}", definition.to_toml_string()?);
            Ok(())
        }
    }
}

pub fn build(args: BuildArgs, out: &Output) -> CmdResult {
    let mut builder = DeckBuilder::from_file(&args.definition)?;
    if let Some(dir) = &args.media_dir {
        builder = builder.media_base_path(dir);
    }
    let output = args
        .output
        .unwrap_or_else(|| args.definition.with_extension("apkg"));
    builder.write_apkg(&output)?;
    info!(output = %output.display(), "Built package");

    let notes = builder.definition().notes.len();
    out.emit(&output, |path| {
        println!("Wrote {} notes to {}", notes, path.display());
    })
}
