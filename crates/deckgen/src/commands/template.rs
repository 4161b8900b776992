//! Template overrides, card CSS, and stored templates.

use std::path::PathBuf;

use clap::Subcommand;
use deckgen_engine::config::TemplateOverride;
use deckgen_engine::template_store::{NewTemplate, StoredTemplate};
use deckgen_engine::{CardShape, Workspace};

use super::{CmdResult, Output, parse_shape};

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Override the generated template for a card type from a JSON file
    Set {
        /// Card type the override applies to
        #[arg(long = "type", value_parser = parse_shape)]
        card_type: CardShape,

        /// JSON file with name, qfmt and afmt
        #[arg(long)]
        file: PathBuf,
    },

    /// Replace the card CSS with the contents of a file
    Css {
        /// CSS file
        #[arg(long)]
        file: PathBuf,
    },

    /// List built-in and stored templates
    List,

    /// Show one template
    Show {
        /// Template identifier
        id: String,
    },

    /// Store a new template
    Create {
        /// Display name; the identifier is derived from it
        name: String,

        /// Card type
        #[arg(long = "type", default_value = "basic", value_parser = parse_shape)]
        card_type: CardShape,

        /// Question format
        #[arg(long)]
        qfmt: String,

        /// Answer format
        #[arg(long)]
        afmt: String,

        /// File with the card CSS
        #[arg(long)]
        css_file: Option<PathBuf>,
    },
}

pub fn run(workspace: &mut Workspace, cmd: TemplateCommand, out: &Output) -> CmdResult {
    match cmd {
        TemplateCommand::Set { card_type, file } => {
            let template = TemplateOverride::from_file(&file)?;
            workspace
                .config_mut()
                .set_template_override(card_type, template);
            workspace.save_config()?;
            println!("Updated {} template from {}", card_type, file.display());
            Ok(())
        }
        TemplateCommand::Css { file } => {
            let css = std::fs::read_to_string(&file)?;
            workspace.config_mut().set_css(css);
            workspace.save_config()?;
            println!("Updated CSS from {}", file.display());
            Ok(())
        }
        TemplateCommand::List => {
            let templates = workspace.templates().list()?;
            out.emit(&templates, |templates| {
                for t in templates {
                    let origin = if t.builtin { "built-in" } else { "custom" };
                    println!("{}\t{}\t{}\t{}", t.id, t.name, t.card_type, origin);
                }
            })
        }
        TemplateCommand::Show { id } => {
            let template = workspace.templates().get(&id)?;
            out.emit(&template, print_template)
        }
        TemplateCommand::Create {
            name,
            card_type,
            qfmt,
            afmt,
            css_file,
        } => {
            let css = css_file.map(std::fs::read_to_string).transpose()?;
            let template = workspace.templates().create(&NewTemplate {
                name,
                card_type,
                qfmt,
                afmt,
                css,
            })?;
            out.emit(&template, print_template)
        }
    }
}

fn print_template(template: &StoredTemplate) {
    println!("{} ({})", template.name, template.id);
    println!("  Card type: {}", template.card_type);
    println!("  Question: {}", template.qfmt);
    println!("  Answer: {}", template.afmt);
}
