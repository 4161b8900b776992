//! Column structure analysis.
//!
//! Decides the card shape from column names and looks for media markers in
//! the first rows of a table.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::Table;

/// Number of rows scanned for media markers.
pub const MEDIA_SAMPLE_ROWS: usize = 5;

/// Shape of the cards generated for a deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardShape {
    /// Question on the front, answer fields on the back.
    #[default]
    Basic,
    /// Part of the first field is hidden.
    Cloze,
}

impl CardShape {
    /// Classify a column set.
    ///
    /// Any column whose name contains `cloze` or `text` (case-insensitive)
    /// makes the deck a cloze deck.
    pub fn classify<S: AsRef<str>>(columns: &[S]) -> Self {
        let is_cloze = columns.iter().any(|c| {
            let name = c.as_ref().to_lowercase();
            name.contains("cloze") || name.contains("text")
        });
        if is_cloze { Self::Cloze } else { Self::Basic }
    }

    /// Lowercase name used in tags and configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cloze => "cloze",
        }
    }
}

impl fmt::Display for CardShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "cloze" => Ok(Self::Cloze),
            other => Err(Error::InvalidInput(format!(
                "unknown card type '{}' (expected basic or cloze)",
                other
            ))),
        }
    }
}

/// Result of analyzing a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Structure {
    /// Field names, one per column, in column order.
    pub fields: Vec<String>,
    /// Field name to column name. Identity when derived from the table.
    pub mapping: Vec<(String, String)>,
    /// Card shape.
    pub shape: CardShape,
    /// Whether the sampled rows reference images or sounds.
    pub has_media: bool,
}

/// Analyze the columns and sampled rows of a table.
pub fn analyze(table: &Table) -> Structure {
    let fields = table.columns.clone();
    let mapping = fields.iter().map(|f| (f.clone(), f.clone())).collect();
    Structure {
        shape: CardShape::classify(&fields),
        has_media: sample_has_media(table.rows.iter().take(MEDIA_SAMPLE_ROWS)),
        fields,
        mapping,
    }
}

fn sample_has_media<'a>(rows: impl Iterator<Item = &'a Vec<String>>) -> bool {
    rows.flatten()
        .any(|cell| img_pattern().is_match(cell) || cell.to_lowercase().contains("[sound:"))
}

fn sound_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[sound:([^\]]+)\]").expect("valid sound regex"))
}

fn img_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<img\s[^>]*?src\s*=\s*(?:"([^"]+)"|'([^']+)'|([^\s"'>]+))"#)
            .expect("valid img regex")
    })
}

/// Local media file names referenced by a cell.
///
/// Remote `http://` and `https://` images are skipped.
pub fn media_references(html: &str) -> Vec<String> {
    let mut files = Vec::new();

    for cap in sound_pattern().captures_iter(html) {
        if let Some(m) = cap.get(1) {
            files.push(m.as_str().to_string());
        }
    }

    for cap in img_pattern().captures_iter(html) {
        if let Some(m) = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)) {
            let src = m.as_str();
            if !src.starts_with("http://") && !src.starts_with("https://") {
                files.push(src.to_string());
            }
        }
    }

    files
}
