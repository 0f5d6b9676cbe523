//! Flat CSV tables backing the recipe and user stores.
//!
//! Every table is read completely into memory and rewritten completely after
//! each mutation. There is no journaling: a crash mid-write can truncate the file.

use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::recipes::model::MalformedRecipeError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid ingredients JSON in row {row}: {source}")]
    Json {
        row: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid record: {0}")]
    Malformed(#[from] MalformedRecipeError),
}

/// Creates the table with only its header row when it does not exist yet,
/// including any missing parent directories.
pub fn ensure_table(path: &Path, header: &[&str]) -> Result<(), StoreError> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    info!(path = %path.display(), "initialising empty table");
    write_rows::<()>(path, header, &[])
}

pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    debug!(path = %path.display(), rows = rows.len(), "table loaded");
    Ok(rows)
}

/// Rewrites the whole table. The header is written explicitly so that an
/// empty table still carries its column names.
pub fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), StoreError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        note: Option<String>,
    }

    const HEADER: &[&str] = &["name", "note"];

    #[test]
    fn test_ensure_table_creates_directories_and_header() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("table.csv");

        ensure_table(&path, HEADER)?;

        assert_eq!(fs::read_to_string(&path)?, "name,note\n");
        assert!(read_rows::<Row>(&path)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_ensure_table_keeps_existing_content() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("table.csv");
        fs::write(&path, "name,note\nkept,\n")?;

        ensure_table(&path, HEADER)?;

        let rows: Vec<Row> = read_rows(&path)?;
        assert_eq!(rows, vec![Row { name: "kept".to_string(), note: None }]);
        Ok(())
    }

    #[test]
    fn test_write_then_read_preserves_empty_optionals() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("table.csv");
        let rows = vec![
            Row { name: "a".to_string(), note: Some("has, comma".to_string()) },
            Row { name: "b".to_string(), note: None },
        ];

        write_rows(&path, HEADER, &rows)?;

        assert_eq!(read_rows::<Row>(&path)?, rows);
        Ok(())
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let result = read_rows::<Row>(Path::new("this_table_does_not_exist.csv"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
