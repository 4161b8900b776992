//! Card template synthesis.
//!
//! Builds question and answer formats from a field list. Configured
//! overrides replace only the keys they set.

use deckgen_builder::TemplateDef;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::structure::CardShape;

/// Tag added to decks that get a reversed template.
pub const REVERSED_TAG: &str = "reversed";

const ANSWER_RULE: &str = "<hr id=\"answer\">";

/// Templates produced for a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    /// One template, or two when a reversed card was added.
    pub templates: Vec<TemplateDef>,
    /// Whether the second template is a reversed card.
    pub reversed: bool,
}

/// A `<b>Field:</b> {{Field}}<br>` answer line.
pub fn labeled_line(field: &str) -> String {
    format!("<b>{field}:</b> {{{{{field}}}}}<br>")
}

fn placeholder(field: &str) -> String {
    format!("{{{{{field}}}}}")
}

/// Synthesize the templates for `fields`.
///
/// Reversed cards are only produced for basic decks with at least two fields
/// and when `create_reversed` is set in `config`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `fields` is empty.
pub fn synthesize(fields: &[String], shape: CardShape, config: &Config) -> Result<TemplateSet> {
    let Some(first) = fields.first() else {
        return Err(Error::InvalidInput("deck has no fields".into()));
    };

    let mut primary = match shape {
        CardShape::Cloze => {
            let cloze = format!("{{{{cloze:{first}}}}}");
            let mut afmt = format!("{cloze}<hr>");
            for field in &fields[1..] {
                afmt.push_str(&labeled_line(field));
            }
            TemplateDef {
                name: "Cloze".to_string(),
                qfmt: cloze,
                afmt,
            }
        }
        CardShape::Basic => {
            let mut afmt = String::from("{{FrontSide}}");
            if fields.len() >= 2 {
                afmt.push_str(ANSWER_RULE);
                for field in &fields[1..] {
                    afmt.push_str(&labeled_line(field));
                }
            }
            TemplateDef {
                name: "Card 1".to_string(),
                qfmt: placeholder(first),
                afmt,
            }
        }
    };

    if let Some(custom) = config.template_override(shape) {
        if let Some(name) = &custom.name {
            primary.name = name.clone();
        }
        if let Some(qfmt) = &custom.qfmt {
            primary.qfmt = qfmt.clone();
        }
        if let Some(afmt) = &custom.afmt {
            primary.afmt = afmt.clone();
        }
    }

    let mut templates = vec![primary];
    let reversed = shape == CardShape::Basic && fields.len() >= 2 && config.create_reversed;
    if reversed {
        let mut afmt = format!("{{{{FrontSide}}}}{ANSWER_RULE}{}", labeled_line(first));
        for field in &fields[2..] {
            afmt.push_str(&labeled_line(field));
        }
        templates.push(TemplateDef {
            name: format!("{} (Reversed)", templates[0].name),
            qfmt: placeholder(&fields[1]),
            afmt,
        });
    }

    Ok(TemplateSet {
        templates,
        reversed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateOverride;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn plain_config() -> Config {
        let mut config = Config::default();
        config.templates.clear();
        config
    }

    #[test]
    fn test_cloze_template() {
        let set = synthesize(
            &fields(&["Text", "Translation", "Notes"]),
            CardShape::Cloze,
            &plain_config(),
        )
        .unwrap();
        assert_eq!(set.templates.len(), 1);
        assert!(!set.reversed);
        let t = &set.templates[0];
        assert_eq!(t.qfmt, "{{cloze:Text}}");
        assert_eq!(
            t.afmt,
            "{{cloze:Text}}<hr><b>Translation:</b> {{Translation}}<br><b>Notes:</b> {{Notes}}<br>"
        );
    }

    #[test]
    fn test_basic_template() {
        let set = synthesize(
            &fields(&["English", "Spanish", "Example"]),
            CardShape::Basic,
            &plain_config(),
        )
        .unwrap();
        let t = &set.templates[0];
        assert_eq!(t.name, "Card 1");
        assert_eq!(t.qfmt, "{{English}}");
        assert_eq!(
            t.afmt,
            "{{FrontSide}}<hr id=\"answer\"><b>Spanish:</b> {{Spanish}}<br><b>Example:</b> {{Example}}<br>"
        );
    }

    #[test]
    fn test_single_field_basic() {
        let set = synthesize(&fields(&["Word"]), CardShape::Basic, &plain_config()).unwrap();
        assert_eq!(set.templates[0].qfmt, "{{Word}}");
        assert_eq!(set.templates[0].afmt, "{{FrontSide}}");
    }

    #[test]
    fn test_reversed_front_back() {
        let mut config = Config::default();
        config.create_reversed = true;
        let set = synthesize(&fields(&["Front", "Back"]), CardShape::Basic, &config).unwrap();

        assert!(set.reversed);
        assert_eq!(set.templates.len(), 2);
        assert_eq!(set.templates[1].name, "Basic Card (Reversed)");
        assert_eq!(set.templates[1].qfmt, "{{Back}}");
        assert_eq!(
            set.templates[1].afmt,
            "{{FrontSide}}<hr id=\"answer\"><b>Front:</b> {{Front}}<br>"
        );
    }

    #[test]
    fn test_reversed_skips_second_field_in_answer() {
        let mut config = plain_config();
        config.create_reversed = true;
        let set = synthesize(&fields(&["A", "B", "C"]), CardShape::Basic, &config).unwrap();
        let afmt = &set.templates[1].afmt;
        assert!(afmt.contains("{{A}}"));
        assert!(afmt.contains("{{C}}"));
        assert!(!afmt.contains("{{B}}"));
    }

    #[test]
    fn test_no_reversed_for_cloze_or_single_field() {
        let mut config = plain_config();
        config.create_reversed = true;
        let cloze = synthesize(&fields(&["Text", "Extra"]), CardShape::Cloze, &config).unwrap();
        assert!(!cloze.reversed);
        let single = synthesize(&fields(&["Front"]), CardShape::Basic, &config).unwrap();
        assert_eq!(single.templates.len(), 1);
    }

    #[test]
    fn test_override_replaces_only_set_keys() {
        let mut config = plain_config();
        config.set_template_override(
            CardShape::Cloze,
            TemplateOverride {
                name: Some("Spanish Cloze".into()),
                qfmt: None,
                afmt: Some("{{cloze:Text}}".into()),
            },
        );
        let set = synthesize(&fields(&["Text", "Translation"]), CardShape::Cloze, &config).unwrap();
        let t = &set.templates[0];
        assert_eq!(t.name, "Spanish Cloze");
        assert_eq!(t.qfmt, "{{cloze:Text}}");
        assert_eq!(t.afmt, "{{cloze:Text}}");
    }

    #[test]
    fn test_no_fields_is_invalid() {
        let err = synthesize(&[], CardShape::Basic, &plain_config()).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
