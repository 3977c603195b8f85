//! JSON document storage shared by every tool.
//!
//! Each tool owns one document under `<home>/data/`. Reads tolerate a missing
//! or empty file. Writes go through [`update`], which holds an exclusive lock
//! for the whole read-modify-write and only persists when the closure succeeds.

use crate::error::Result;
use crate::{io, paths};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub trait Document: Serialize + DeserializeOwned + Default {
    /// File name under `<home>/data/`.
    const FILE: &'static str;

    fn path(home: &Path) -> PathBuf {
        paths::data_file(home, Self::FILE)
    }
}

pub fn load<D: Document>(home: &Path) -> Result<D> {
    let path = D::path(home);
    let content = io::read_or_empty(&path)?;
    if content.trim().is_empty() {
        return Ok(D::default());
    }
    Ok(serde_json::from_str(&content)?)
}

pub fn save<D: Document>(home: &Path, doc: &D) -> Result<()> {
    let path = D::path(home);
    let mut data = serde_json::to_string_pretty(doc)?;
    data.push('\n');
    io::atomic_write(&path, data.as_bytes())?;
    tracing::debug!(file = %path.display(), "saved document");
    Ok(())
}

/// Locked read-modify-write. The document is saved only if `f` returns `Ok`.
pub fn update<D, R, F>(home: &Path, f: F) -> Result<R>
where
    D: Document,
    F: FnOnce(&mut D) -> Result<R>,
{
    let _lock = io::FileLock::acquire(&D::path(home))?;
    let mut doc: D = load(home)?;
    let out = f(&mut doc)?;
    save(home, &doc)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// IdSeq
// ---------------------------------------------------------------------------

/// Monotonic id counter stored alongside the records it numbers.
///
/// Never decremented, so deleting the newest record does not free its id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdSeq(u64);

impl IdSeq {
    /// Allocate the next id. `existing` guards against a hand-edited file whose
    /// counter fell behind its records.
    pub fn next(&mut self, existing: impl IntoIterator<Item = u64>) -> u64 {
        let max = existing.into_iter().max().unwrap_or(0);
        self.0 = self.0.max(max) + 1;
        self.0
    }

    /// Raise the counter so that `id` is considered used.
    pub fn observe(&mut self, id: u64) {
        self.0 = self.0.max(id);
    }

    pub fn last(&self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifeError;
    use tempfile::TempDir;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Counter {
        #[serde(default)]
        next_id: IdSeq,
        #[serde(default)]
        values: Vec<u64>,
    }

    impl Document for Counter {
        const FILE: &'static str = "counter.json";
    }

    #[test]
    fn load_missing_is_default() {
        let dir = TempDir::new().unwrap();
        let doc: Counter = load(dir.path()).unwrap();
        assert!(doc.values.is_empty());
    }

    #[test]
    fn update_persists_changes() {
        let dir = TempDir::new().unwrap();
        let id = update(dir.path(), |doc: &mut Counter| {
            let id = doc.next_id.next(doc.values.iter().copied());
            doc.values.push(id);
            Ok(id)
        })
        .unwrap();
        assert_eq!(id, 1);
        let doc: Counter = load(dir.path()).unwrap();
        assert_eq!(doc.values, vec![1]);
        assert!(dir.path().join("data/counter.json").exists());
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        update(dir.path(), |doc: &mut Counter| {
            doc.values.push(7);
            Ok(())
        })
        .unwrap();
        let err = update(dir.path(), |doc: &mut Counter| -> Result<()> {
            doc.values.clear();
            Err(LifeError::InvalidInput("nope".into()))
        });
        assert!(err.is_err());
        let doc: Counter = load(dir.path()).unwrap();
        assert_eq!(doc.values, vec![7]);
    }

    #[test]
    fn id_seq_never_reuses() {
        let mut seq = IdSeq::default();
        assert_eq!(seq.next([]), 1);
        assert_eq!(seq.next([1]), 2);
        // Record 2 deleted; counter still moves forward.
        assert_eq!(seq.next([1]), 3);
    }

    #[test]
    fn id_seq_catches_up_with_existing() {
        let mut seq = IdSeq::default();
        assert_eq!(seq.next([4, 9, 2]), 10);
    }

    #[test]
    fn empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/counter.json"), "  \n").unwrap();
        let doc: Counter = load(dir.path()).unwrap();
        assert_eq!(doc.next_id.last(), 0);
    }
}
