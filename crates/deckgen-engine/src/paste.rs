//! Pasted-text parsing.
//!
//! Pasted text has one card per line with values split by a separator. If
//! the first line looks like a header it names the columns. Otherwise the
//! column names come from a [`ColumnPreset`].

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::assemble::{GENERIC_LANGUAGE, SUPPORTED_LANGUAGES, capitalize};
use crate::error::{Error, Result};
use crate::structure::CardShape;
use crate::table::{Table, unique_columns};

/// Separator used when none is given.
pub const DEFAULT_SEPARATOR: &str = "\t";

/// Header words, besides language names, that mark the first line as a header.
pub const KNOWN_HEADERS: &[&str] = &[
    "front",
    "back",
    "english",
    "text",
    "translation",
    "example",
    "notes",
    "explanation",
];

/// Named column layouts for header-less text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPreset {
    /// `Front`, `Back`.
    Basic,
    /// `English`, the language name, `Example`, `Notes`.
    Vocabulary,
    /// `Text`, `Translation`, `Explanation`, `Notes`.
    Cloze,
}

impl ColumnPreset {
    /// Column names for `count` columns.
    ///
    /// The preset is cut to `count` names and any columns past its end are
    /// called `Column{n}` (1-based).
    pub fn columns(self, count: usize, language: &str) -> Vec<String> {
        let base: Vec<String> = match self {
            Self::Basic => vec!["Front".into(), "Back".into()],
            Self::Vocabulary => {
                let generic =
                    language.is_empty() || language.eq_ignore_ascii_case(GENERIC_LANGUAGE);
                let target = if generic {
                    "Translation".to_string()
                } else {
                    capitalize(language)
                };
                vec!["English".into(), target, "Example".into(), "Notes".into()]
            }
            Self::Cloze => vec![
                "Text".into(),
                "Translation".into(),
                "Explanation".into(),
                "Notes".into(),
            ],
        };

        (0..count)
            .map(|i| base.get(i).cloned().unwrap_or_else(|| format!("Column{}", i + 1)))
            .collect()
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Vocabulary => "vocabulary",
            Self::Cloze => "cloze",
        }
    }
}

impl fmt::Display for ColumnPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "vocabulary" | "vocab" => Ok(Self::Vocabulary),
            "cloze" => Ok(Self::Cloze),
            other => Err(Error::InvalidInput(format!(
                "unknown column preset '{}' (expected basic, vocabulary or cloze)",
                other
            ))),
        }
    }
}

/// Options for [`parse_text`].
#[derive(Debug, Clone)]
pub struct PasteOptions {
    /// Value separator.
    pub separator: String,
    /// Preset to use when there is no header.
    pub preset: Option<ColumnPreset>,
    /// Requested card shape, used to pick a preset.
    pub shape: Option<CardShape>,
    /// Deck language, used to name the vocabulary translation column.
    pub language: String,
}

impl Default for PasteOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            preset: None,
            shape: None,
            language: GENERIC_LANGUAGE.to_string(),
        }
    }
}

/// Whether a token is a recognized header word.
///
/// Matching ignores case, surrounding whitespace and a trailing
/// parenthetical such as `Spanish (es)`.
pub fn is_known_header(token: &str) -> bool {
    let mut word = token.trim();
    if word.ends_with(')') {
        if let Some(open) = word.rfind('(') {
            word = word[..open].trim_end();
        }
    }
    let word = word.to_lowercase();
    KNOWN_HEADERS.contains(&word.as_str()) || SUPPORTED_LANGUAGES.contains(&word.as_str())
}

/// Parse pasted text into a table.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the text has no lines, when every
/// data line is empty, or when the separator is empty.
pub fn parse_text(text: &str, options: &PasteOptions) -> Result<Table> {
    if options.separator.is_empty() {
        return Err(Error::InvalidInput("separator must not be empty".into()));
    }

    let lines: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(options.separator.as_str())
                .map(|v| v.trim().to_string())
                .collect()
        })
        .collect();

    let Some(first) = lines.first() else {
        return Err(Error::InvalidInput("No valid lines found in text".into()));
    };

    let has_header = first.iter().any(|token| is_known_header(token));
    let (columns, data) = if has_header {
        (unique_columns(first), &lines[1..])
    } else {
        let count = lines.iter().map(Vec::len).max().unwrap_or(0);
        let preset = options.preset.unwrap_or_else(|| auto_preset(&lines, options.shape));
        debug!(%preset, count, "No header line, using preset");
        (preset.columns(count, &options.language), &lines[..])
    };

    let mut table = Table::new(columns);
    for values in data {
        if values.iter().all(|v| v.is_empty()) {
            continue;
        }
        let mut row = values.clone();
        row.resize(table.columns.len(), String::new());
        table.rows.push(row);
    }

    if table.rows.is_empty() {
        return Err(Error::InvalidInput("No valid card data found in text".into()));
    }

    debug!(
        header = has_header,
        columns = table.columns.len(),
        rows = table.rows.len(),
        "Parsed pasted text"
    );
    Ok(table)
}

fn auto_preset(lines: &[Vec<String>], shape: Option<CardShape>) -> ColumnPreset {
    let shape = shape.unwrap_or_else(|| {
        let has_cloze = lines
            .iter()
            .flatten()
            .any(|v| v.contains("{{c") && v.contains("::"));
        if has_cloze {
            CardShape::Cloze
        } else {
            CardShape::Basic
        }
    });
    match shape {
        CardShape::Cloze => ColumnPreset::Cloze,
        CardShape::Basic => ColumnPreset::Vocabulary,
    }
}
