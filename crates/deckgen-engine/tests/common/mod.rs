//! Common test utilities for deckgen-engine workflow tests.

use std::io::Read;
use std::path::Path;

use deckgen_engine::Workspace;
use rusqlite::Connection;
use tempfile::{TempDir, tempdir};
use zip::ZipArchive;

/// Create a workspace with the standard layout in a fresh directory.
///
/// The directory is removed when the returned guard is dropped.
pub fn setup_workspace() -> (TempDir, Workspace) {
    let dir = tempdir().unwrap();
    let workspace = Workspace::open(dir.path()).unwrap();
    workspace.paths().ensure_dirs().unwrap();
    (dir, workspace)
}

/// Write a table under `csv/` and return its path.
pub fn write_csv(workspace: &Workspace, name: &str, content: &str) -> std::path::PathBuf {
    let path = workspace.paths().csv_dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Extract the collection from an .apkg file and open it.
///
/// The returned directory must outlive the connection.
#[allow(dead_code)]
pub fn open_apkg_database(apkg_path: &Path) -> (TempDir, Connection) {
    let file = std::fs::File::open(apkg_path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();

    let mut db_file = archive.by_name("collection.anki2").unwrap();
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("collection.anki2");
    let mut db_bytes = Vec::new();
    db_file.read_to_end(&mut db_bytes).unwrap();
    std::fs::write(&db_path, &db_bytes).unwrap();

    let conn = Connection::open(&db_path).unwrap();
    (temp_dir, conn)
}

/// Names of the files stored in an .apkg media manifest.
#[allow(dead_code)]
pub fn media_names(apkg_path: &Path) -> Vec<String> {
    let file = std::fs::File::open(apkg_path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut manifest = archive.by_name("media").unwrap();
    let mut content = String::new();
    manifest.read_to_string(&mut content).unwrap();

    let map: std::collections::HashMap<String, String> = serde_json::from_str(&content).unwrap();
    let mut names: Vec<String> = map.into_values().collect();
    names.sort();
    names
}

/// Run a single-value query.
#[allow(dead_code)]
pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
