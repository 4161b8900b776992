//! Generation history.
//!
//! Every successful generation appends an entry to a JSON array stored next
//! to the generated packages. The file is read, extended and rewritten whole
//! for each entry; concurrent writers are not coordinated.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// File name of the history log inside the output directory.
pub const HISTORY_FILE: &str = "generation_history.json";

/// One generated package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Source table file name.
    pub csv_file: String,
    /// Package file name.
    pub output_file: String,
    /// Deck tags at generation time.
    pub tags: Vec<String>,
    /// When the package was written.
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// An entry stamped with the current time.
    ///
    /// Only the file names of `csv_path` and `output_path` are kept.
    pub fn now(csv_path: &Path, output_path: &Path, tags: Vec<String>) -> Self {
        Self {
            csv_file: file_name(csv_path),
            output_file: file_name(output_path),
            tags,
            timestamp: Utc::now(),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The history log file.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    /// History stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, oldest first. A missing file has no entries.
    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Append an entry and rewrite the log.
    pub fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.load()?;
        entries.push(entry);

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, &entries)?;
        file.write_all(b"\n")?;
        file.persist(&self.path)?;

        debug!(path = %self.path.display(), entries = entries.len(), "Recorded generation");
        Ok(())
    }
}
