//! Quick notes: one-line captures with optional tags.
//!
//! Layout:
//!   <home>/data/notes.json

use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use crate::text;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoteBook {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Document for NoteBook {
    const FILE: &'static str = "notes.json";
}

impl NoteBook {
    pub fn add(&mut self, text: &str, tags: &[String]) -> Result<&Note> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifeError::InvalidInput("note text cannot be empty".into()));
        }
        let id = self.next_id.next(self.notes.iter().map(|n| n.id));
        self.notes.push(Note {
            id,
            text: text.to_string(),
            tags: text::normalize_tags(tags),
            created_at: Utc::now(),
        });
        Ok(&self.notes[self.notes.len() - 1])
    }

    pub fn get(&self, id: u64) -> Result<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| LifeError::not_found("note", id))
    }

    pub fn remove(&mut self, id: u64) -> Result<Note> {
        let pos = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| LifeError::not_found("note", id))?;
        Ok(self.notes.remove(pos))
    }

    /// Remove every note. The id counter keeps its value.
    pub fn clear(&mut self) -> usize {
        let n = self.notes.len();
        self.notes.clear();
        n
    }

    /// Newest first, optionally filtered by tag and capped at `limit`.
    pub fn recent(&self, tag: Option<&str>, limit: Option<usize>) -> Vec<&Note> {
        self.notes
            .iter()
            .rev()
            .filter(|n| tag.map_or(true, |t| text::has_tag(&n.tags, t)))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| {
                text::matches_any(
                    query,
                    std::iter::once(n.text.as_str()).chain(n.tags.iter().map(String::as_str)),
                )
            })
            .collect()
    }

    /// Tag → note count, alphabetical.
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.notes.iter().flat_map(|n| n.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}

pub fn load(home: &Path) -> Result<NoteBook> {
    store::load(home)
}

pub fn add(home: &Path, text: &str, tags: &[String]) -> Result<Note> {
    store::update(home, |book: &mut NoteBook| book.add(text, tags).cloned())
}

/// Markdown document with one bullet per note, oldest first.
pub fn to_markdown(notes: &[Note]) -> String {
    let mut out = String::from("# Quick Notes\n\n");
    for note in notes {
        let stamp = note.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        out.push_str(&format!("- **#{}** _{}_ {}", note.id, stamp, note.text));
        if !note.tags.is_empty() {
            let tags: Vec<String> = note.tags.iter().map(|t| format!("#{t}")).collect();
            out.push_str(&format!(" ({})", tags.join(" ")));
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn add_and_list_newest_first() {
        let mut book = NoteBook::default();
        book.add("first", &[]).unwrap();
        book.add("second", &["idea".to_string()]).unwrap();
        let recent = book.recent(None, None);
        assert_eq!(recent[0].text, "second");
        assert_eq!(book.recent(Some("idea"), None).len(), 1);
        assert_eq!(book.recent(None, Some(1)).len(), 1);
    }

    #[test]
    fn clear_keeps_counter() {
        let mut book = NoteBook::default();
        book.add("a", &[]).unwrap();
        book.add("b", &[]).unwrap();
        assert_eq!(book.clear(), 2);
        let id = book.add("c", &[]).unwrap().id;
        assert_eq!(id, 3);
    }

    #[test]
    fn search_and_tags() {
        let mut book = NoteBook::default();
        book.add("Read the Rust book", &["learning".to_string()]).unwrap();
        book.add("call plumber", &["home,urgent".to_string()]).unwrap();
        assert_eq!(book.search("rust").len(), 1);
        assert_eq!(book.search("URGENT").len(), 1);
        let counts = book.tag_counts();
        assert_eq!(counts.get("home"), Some(&1));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn remove_unknown_fails() {
        let mut book = NoteBook::default();
        assert!(matches!(book.remove(1), Err(LifeError::NotFound { .. })));
    }

    #[test]
    fn markdown_export() {
        let dir = TempDir::new().unwrap();
        add(dir.path(), "Some idea", &["x".to_string()]).unwrap();
        let book = load(dir.path()).unwrap();
        let md = to_markdown(&book.notes);
        assert!(md.starts_with("# Quick Notes"));
        assert!(md.contains("Some idea"));
        assert!(md.contains("#x"));
    }
}
