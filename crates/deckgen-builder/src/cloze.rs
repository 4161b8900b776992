//! Cloze deletion helpers.
//!
//! Cloze deletions use the format `{{c1::text}}` where `c1` is the cloze
//! number and `text` is hidden on the card. An optional hint follows a second
//! `::` separator: `{{c1::text::hint}}`.
//!
//! A cloze note produces one card per distinct cloze number found in its
//! cloze field.
//!
//! # Example
//!
//! ```
//! use deckgen_builder::cloze::{cloze, cloze_ordinals};
//!
//! let sentence = format!("Yo {} de Madrid.", cloze(1, "soy"));
//! assert_eq!(sentence, "Yo {{c1::soy}} de Madrid.");
//! assert_eq!(cloze_ordinals(&sentence), vec![0]);
//! ```

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex_lite::Regex;

fn cloze_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{c(\d+)::").expect("valid cloze pattern"))
}

/// Create a cloze deletion with the given number.
pub fn cloze(number: u32, text: &str) -> String {
    format!("{{{{c{}::{}}}}}", number, text)
}

/// Zero-based card ordinals for the cloze numbers used in `text`.
///
/// Returns the sorted, distinct `cN - 1` values. Text without any cloze
/// deletion still yields a single ordinal `0` so that every cloze note
/// produces at least one card.
pub fn cloze_ordinals(text: &str) -> Vec<u32> {
    let ordinals: BTreeSet<u32> = cloze_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .map(|n| n - 1)
        .collect();

    if ordinals.is_empty() {
        vec![0]
    } else {
        ordinals.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloze_format() {
        assert_eq!(cloze(2, "cell"), "{{c2::cell}}");
    }

    #[test]
    fn test_ordinals_are_distinct_and_sorted() {
        let text = "{{c2::b}} {{c1::a}} {{c2::again::hint}}";
        assert_eq!(cloze_ordinals(text), vec![0, 1]);
    }

    #[test]
    fn test_ordinals_default_to_first_card() {
        assert_eq!(cloze_ordinals("no deletions here"), vec![0]);
        assert_eq!(cloze_ordinals("{{c0::ignored}}"), vec![0]);
    }
}
