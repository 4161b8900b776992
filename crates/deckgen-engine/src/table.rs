//! Header-first tabular files backing each deck.
//!
//! A deck is stored as one CSV or TSV file whose first row names the fields.
//! The delimiter is chosen by looking for a tab on the first line; it is
//! remembered so a rewritten file keeps its original format.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// An in-memory table: ordered column names plus rows of cell text.
///
/// Every row holds exactly one cell per column. Short rows are padded with
/// empty strings and surplus cells are dropped when the table is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Data rows.
    pub rows: Vec<Vec<String>>,
    delimiter: u8,
}

impl Table {
    /// Create an empty comma-delimited table.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            delimiter: b',',
        }
    }

    /// Pick the delimiter for a document from its first line.
    pub fn detect_delimiter(content: &str) -> u8 {
        match content.lines().next() {
            Some(line) if line.contains('\t') => b'\t',
            _ => b',',
        }
    }

    /// Parse a table from text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the text is blank or has no header.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("CSV file is empty".into()));
        }

        let delimiter = Self::detect_delimiter(content);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let header: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if header.iter().all(|c| c.is_empty()) {
            return Err(Error::InvalidInput("CSV file has no header row".into()));
        }
        let columns = unique_columns(&header);
        if columns != header {
            debug!(?header, ?columns, "Renamed blank or repeated columns");
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            columns,
            rows,
            delimiter,
        })
    }

    /// Read a table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the file does not exist.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(format!("file {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let table = Self::parse(&content)?;
        debug!(
            path = %path.display(),
            columns = table.columns.len(),
            rows = table.rows.len(),
            "Read table"
        );
        Ok(table)
    }

    /// Replace the file at `path` with this table.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .from_writer(&mut file);
            writer.write_record(&self.columns)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        file.flush()?;
        file.persist(path)?;
        debug!(path = %path.display(), rows = self.rows.len(), "Wrote table");
        Ok(())
    }

    /// The delimiter used when writing.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Row `index` as a field name to value map.
    pub fn record(&self, index: usize) -> Option<HashMap<String, String>> {
        self.rows.get(index).map(|row| self.to_record(row))
    }

    /// Every row as a field name to value map.
    pub fn records(&self) -> Vec<HashMap<String, String>> {
        self.rows.iter().map(|row| self.to_record(row)).collect()
    }

    /// Build a row in column order from a field map.
    ///
    /// Columns missing from `fields` get an empty string.
    pub fn row_from(&self, fields: &HashMap<String, String>) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| fields.get(c).cloned().unwrap_or_default())
            .collect()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn to_record(&self, row: &[String]) -> HashMap<String, String> {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }
}

/// Column names with blank and repeated entries replaced by `Column{n}`
/// (1-based position), so every name is non-empty and unique.
pub fn unique_columns(names: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if !name.is_empty() && !columns.contains(name) {
            columns.push(name.clone());
            continue;
        }
        let mut candidate = format!("Column{}", i + 1);
        let mut n = 1;
        while columns.contains(&candidate) || names[i + 1..].contains(&candidate) {
            n += 1;
            candidate = format!("Column{}_{}", i + 1, n);
        }
        columns.push(candidate);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(Table::detect_delimiter("a\tb\n1,2\t3"), b'\t');
        assert_eq!(Table::detect_delimiter("a,b\n1\t2"), b',');
        assert_eq!(Table::detect_delimiter(""), b',');
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let table = Table::parse("Front,Back,Notes\nhola,hello\n").unwrap();
        assert_eq!(table.columns, vec!["Front", "Back", "Notes"]);
        assert_eq!(table.rows, vec![vec!["hola", "hello", ""]]);
    }

    #[test]
    fn test_parse_renames_repeated_columns() {
        let table = Table::parse("Front,Front,\nuno,one,x\n").unwrap();
        assert_eq!(table.columns, vec!["Front", "Column2", "Column3"]);
        assert_eq!(table.rows, vec![vec!["uno", "one", "x"]]);
    }

    #[test]
    fn test_unique_columns_avoids_existing_names() {
        let names: Vec<String> = ["A", "A", "Column2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_columns(&names), vec!["A", "Column2_2", "Column2"]);
    }

    #[test]
    fn test_parse_tsv_with_commas_in_cells() {
        let table = Table::parse("Text\tTranslation\nYo {{c1::soy}}, sí\tI am, yes\n").unwrap();
        assert_eq!(table.delimiter(), b'\t');
        assert_eq!(table.rows[0][1], "I am, yes");
    }

    #[test]
    fn test_parse_empty_is_invalid() {
        let err = Table::parse("  \n").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("CSV file is empty"));
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let err = Table::read(dir.path().join("missing.csv")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_keeps_delimiter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deck.csv");
        let mut table = Table::parse("Front\tBack\n").unwrap();
        table.rows.push(vec!["uno".into(), "one".into()]);
        table.write(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "Front\tBack\nuno\tone\n");
        assert_eq!(Table::read(&path).unwrap(), table);
    }

    #[test]
    fn test_row_from_fills_missing() {
        let table = Table::new(vec!["Front".into(), "Back".into()]);
        let fields = HashMap::from([("Back".to_string(), "one".to_string())]);
        assert_eq!(table.row_from(&fields), vec!["", "one"]);
    }
}
