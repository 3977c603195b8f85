//! Append-only CSV logs (time entries, focus sessions).
//!
//! Rows are flat serde records; the header row is written when the file is
//! created. Callers serialize writers through the lock on the tool's state
//! document.

use crate::error::{LifeError, Result};
use crate::io;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub fn read<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = io::read_or_empty(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn append<T: Serialize>(path: &Path, row: &T) -> Result<()> {
    let fresh = io::read_or_empty(path)?.trim().is_empty();
    if fresh {
        return write_all(path, std::slice::from_ref(row));
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.serialize(row)?;
    let bytes = finish(wtr)?;
    io::append_text(path, &String::from_utf8_lossy(&bytes))
}

/// Rewrite the whole log, header included.
pub fn write_all<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    io::atomic_write(path, &to_bytes(rows)?)
}

pub fn to_bytes<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| LifeError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        label: String,
        note: Option<String>,
    }

    #[test]
    fn append_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/log.csv");
        append(&path, &Row { id: 1, label: "a, b".into(), note: None }).unwrap();
        append(&path, &Row { id: 2, label: "c".into(), note: Some("x".into()) }).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("id,label,note").count(), 1);
        let rows: Vec<Row> = read(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "a, b");
        assert_eq!(rows[0].note, None);
        assert_eq!(rows[1].note.as_deref(), Some("x"));
    }

    #[test]
    fn read_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let rows: Vec<Row> = read(&dir.path().join("none.csv")).unwrap();
        assert!(rows.is_empty());
    }
}
