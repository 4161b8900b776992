//! Heuristic tag inference.
//!
//! Tags are derived from the file stem, the column names, the deck language
//! and the configuration in a fixed sequence of stages. Each stage except the
//! custom-pattern stage can be switched off through [`TagFilters`]. The
//! semantic categories matched against the file stem live in one static
//! table, [`CATEGORIES`], consumed by a single matching routine.
//!
//! # Example
//!
//! ```
//! use deckgen_engine::config::Config;
//! use deckgen_engine::tags::infer_tags;
//!
//! let columns = vec!["English".to_string(), "Spanish".to_string()];
//! let tags = infer_tags("spanish_food_vocab", &columns, "spanish", &Config::default());
//! assert_eq!(
//!     tags,
//!     ["spanish", "auto-generated", "basic", "food", "vocab", "vocabulary", "translation"]
//! );
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::Workspace;
use crate::assemble;
use crate::config::{Config, TagFilters};
use crate::decks::DeckFilter;
use crate::error::Result;
use crate::structure::CardShape;

/// Tag added by the source stage.
pub const SOURCE_TAG: &str = "auto-generated";

/// Filename tokens that never become tags.
pub const STOP_WORDS: &[&str] = &[
    "deck", "card", "cards", "anki", "full", "new", "updated", "final", "draft", "test",
];

/// Target languages recognized next to an `english` column.
const TRANSLATION_LANGUAGES: &[&str] = &["spanish", "french", "german", "italian"];

/// The gate governing a semantic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagGroup {
    /// Parts of speech.
    Grammar,
    /// Vocabulary and tenses.
    Content,
    /// Multi-word constructions.
    LanguageConstruct,
}

impl TagGroup {
    /// Whether this group is enabled in `filters`.
    pub fn enabled(self, filters: &TagFilters) -> bool {
        match self {
            Self::Grammar => filters.grammar,
            Self::Content => filters.content,
            Self::LanguageConstruct => filters.language_construct,
        }
    }
}

/// A semantic category: the tag it yields and the substrings that trigger it.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    /// Tag appended on a match.
    pub tag: &'static str,
    /// Gate that must be enabled.
    pub group: TagGroup,
    /// Lowercase substrings searched for in the file stem.
    pub triggers: &'static [&'static str],
}

impl Category {
    /// Number of triggers found in `text`, which must already be lowercase.
    pub fn matches(&self, text: &str) -> usize {
        self.triggers.iter().filter(|t| text.contains(*t)).count()
    }
}

const fn category(
    tag: &'static str,
    group: TagGroup,
    triggers: &'static [&'static str],
) -> Category {
    Category {
        tag,
        group,
        triggers,
    }
}

/// Semantic categories in matching order.
pub static CATEGORIES: &[Category] = &[
    category("verb", TagGroup::Grammar, &["verb", "conjugation", "tense", "infinitive"]),
    category("noun", TagGroup::Grammar, &["noun", "substantive", "object", "thing"]),
    category("adjective", TagGroup::Grammar, &["adjective", "adj", "descriptor"]),
    category("adverb", TagGroup::Grammar, &["adverb", "adv"]),
    category("preposition", TagGroup::Grammar, &["preposition", "prep"]),
    category("pronoun", TagGroup::Grammar, &["pronoun", "subject", "object"]),
    category(
        "vocabulary",
        TagGroup::Content,
        &["vocab", "word", "dictionary", "lexicon", "term"],
    ),
    category("present", TagGroup::Content, &["present", "presents", "currently"]),
    category(
        "past",
        TagGroup::Content,
        &["past", "preterite", "imperfect", "historical"],
    ),
    category("future", TagGroup::Content, &["future", "will", "going to"]),
    category("conditional", TagGroup::Content, &["conditional", "would"]),
    category("subjunctive", TagGroup::Content, &["subjunctive", "subjuntivo"]),
    category("imperative", TagGroup::Content, &["imperative", "command", "order"]),
    category("ir-a", TagGroup::LanguageConstruct, &["ir a", "going to", "future"]),
    category(
        "ser-estar",
        TagGroup::LanguageConstruct,
        &["ser estar", "being", "to be"],
    ),
    category("por-para", TagGroup::LanguageConstruct, &["por para", "for"]),
];

/// Derive the ordered, de-duplicated tag list for a table.
///
/// `stem` is the file name without extension. The result only depends on the
/// arguments, so repeated calls give identical lists.
pub fn infer_tags<S: AsRef<str>>(
    stem: &str,
    columns: &[S],
    language: &str,
    config: &Config,
) -> Vec<String> {
    let filters = &config.tag_filters;
    let lower_stem = stem.to_lowercase();
    let mut tags: Vec<String> = Vec::new();

    if filters.language {
        tags.push(language.to_lowercase());
    }

    if filters.source {
        tags.push(SOURCE_TAG.to_string());
    }

    if filters.card_type {
        tags.push(CardShape::classify(columns).as_str().to_string());
    }

    if filters.filename {
        tags.extend(filename_tokens(stem));
    }

    for (pattern, custom) in &config.custom_tags {
        if stem.contains(pattern.as_str()) {
            tags.extend(custom.iter().map(|t| t.to_lowercase()));
        }
    }

    for category in CATEGORIES {
        if category.group.enabled(filters)
            && category.matches(&lower_stem) > 0
            && !tags.iter().any(|t| t == category.tag)
        {
            tags.push(category.tag.to_string());
        }
    }

    if lower_stem.contains("ir")
        && lower_stem.contains('a')
        && (lower_stem.contains("infinitive") || lower_stem.contains("future"))
    {
        push_unique(&mut tags, "ir-a");
        if filters.grammar {
            push_unique(&mut tags, "future");
        }
    }

    let lower_columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_lowercase()).collect();
    if lower_columns.iter().any(|c| c == "english")
        && lower_columns
            .iter()
            .any(|c| TRANSLATION_LANGUAGES.contains(&c.as_str()))
    {
        tags.push("translation".to_string());
    }
    if filters.grammar && lower_columns.iter().any(|c| c == "person") {
        tags.push("person".to_string());
    }

    dedupe(tags)
}

/// Meaningful lowercase words of a file stem.
///
/// The stem is split on `_`, `-` and whitespace. Single characters and
/// [`STOP_WORDS`] are dropped.
pub fn filename_tokens(stem: &str) -> impl Iterator<Item = String> + '_ {
    stem.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > 1 && !STOP_WORDS.contains(&token.as_str()))
}

/// Remove repeated tags, keeping the first occurrence of each.
pub fn dedupe(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    if !tags.iter().any(|t| t == tag) {
        tags.push(tag.to_string());
    }
}

/// A category that matched free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSuggestion {
    /// Suggested tag.
    pub tag: String,
    /// Number of triggers found.
    pub count: usize,
}

/// Suggest category tags for free text, such as a file name or card content.
///
/// Every category is considered regardless of the tag filters.
pub fn suggest(text: &str) -> Vec<TagSuggestion> {
    let text = text.to_lowercase();
    let mut suggestions: Vec<TagSuggestion> = Vec::new();

    for category in CATEGORIES {
        let count = category.matches(&text);
        if count == 0 {
            continue;
        }
        match suggestions.iter_mut().find(|s| s.tag == category.tag) {
            Some(existing) => existing.count += count,
            None => suggestions.push(TagSuggestion {
                tag: category.tag.to_string(),
                count,
            }),
        }
    }

    suggestions
}

/// Tag queries over the workspace.
#[derive(Debug)]
pub struct TagEngine<'a> {
    workspace: &'a Workspace,
}

impl<'a> TagEngine<'a> {
    pub(crate) fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Tags a table would be generated with, including the media and
    /// reversed tags.
    pub fn show(&self, csv_path: &Path, language: &str) -> Result<Vec<String>> {
        let (descriptor, _) = assemble::assemble(csv_path, language, self.workspace.config())?;
        Ok(descriptor.tags)
    }

    /// Every tag carried by some deck, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let tags: BTreeSet<String> = self
            .workspace
            .decks()
            .list(&DeckFilter::default())?
            .into_iter()
            .flat_map(|deck| deck.tags)
            .collect();
        Ok(tags.into_iter().collect())
    }

    /// Category suggestions for free text.
    pub fn suggest(&self, text: &str) -> Vec<TagSuggestion> {
        suggest(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_french_present_tense_irregular() {
        let tags = infer_tags(
            "french_present_tense_irregular",
            &cols(&["Text", "Translation"]),
            "french",
            &Config::default(),
        );
        // "tense" is also a trigger of the verb category.
        assert_eq!(
            tags,
            [
                "french",
                "auto-generated",
                "cloze",
                "present",
                "tense",
                "irregular",
                "verb"
            ]
        );
        assert_eq!(
            &tags[..6],
            ["french", "auto-generated", "cloze", "present", "tense", "irregular"]
        );
    }

    #[test]
    fn test_inference_is_deterministic_and_unique() {
        let columns = cols(&["English", "Spanish", "Person"]);
        let mut config = Config::default();
        config
            .add_custom_tags("verbs", vec!["Verb".into(), "drill".into()])
            .unwrap();

        for stem in [
            "spanish_verbs_future",
            "ir_a_infinitive",
            "deck",
            "",
            "Ser-Estar being To Be",
        ] {
            let first = infer_tags(stem, &columns, "spanish", &config);
            let second = infer_tags(stem, &columns, "spanish", &config);
            assert_eq!(first, second);

            let unique: HashSet<_> = first.iter().collect();
            assert_eq!(unique.len(), first.len(), "duplicates for {:?}", stem);
            assert!(first.iter().all(|t| *t == t.to_lowercase()));
        }
    }

    #[test]
    fn test_filename_stop_words_and_short_tokens() {
        let tokens: Vec<_> = filename_tokens("New_Anki-deck a Colors final_v2").collect();
        assert_eq!(tokens, ["colors", "v2"]);
    }

    #[test]
    fn test_disabled_gates_skip_stages() {
        let mut config = Config::default();
        config.tag_filters = TagFilters::none();
        config
            .add_custom_tags("food", vec!["Comida".into()])
            .unwrap();

        let tags = infer_tags("spanish_food_verbs", &cols(&["Front", "Back"]), "spanish", &config);
        assert_eq!(tags, ["comida"]);
    }

    #[test]
    fn test_ir_a_special_rule() {
        let mut config = Config::default();
        config.tag_filters.language_construct = false;

        let tags = infer_tags("ir_a_infinitive", &cols(&["Text"]), "spanish", &config);
        assert!(tags.contains(&"ir-a".to_string()));
        assert!(tags.contains(&"future".to_string()));

        config.tag_filters.grammar = false;
        let tags = infer_tags("ir_a_infinitive", &cols(&["Text"]), "spanish", &config);
        assert!(tags.contains(&"ir-a".to_string()));
        assert!(!tags.contains(&"future".to_string()));
    }

    #[test]
    fn test_translation_and_person_columns() {
        let tags = infer_tags(
            "greetings",
            &cols(&["English", "French"]),
            "french",
            &Config::default(),
        );
        assert!(tags.contains(&"translation".to_string()));

        let mut config = Config::default();
        config.tag_filters = TagFilters::none();
        let tags = infer_tags("x", &cols(&["English", "German", "Person"]), "german", &config);
        assert_eq!(tags, ["translation"]);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let tags = dedupe(cols(&["b", "a", "b", "c", "a"]));
        assert_eq!(tags, ["b", "a", "c"]);
    }

    #[test]
    fn test_suggest_counts_triggers() {
        let suggestions = suggest("Verb conjugation in the past tense");
        assert_eq!(
            suggestions,
            vec![
                TagSuggestion {
                    tag: "verb".into(),
                    count: 3
                },
                TagSuggestion {
                    tag: "past".into(),
                    count: 1
                },
            ]
        );
        assert!(suggest("").is_empty());
    }
}
