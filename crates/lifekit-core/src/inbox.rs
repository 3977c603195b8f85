//! Inbox: capture first, decide later. Processing an item turns it into a
//! task or a quick note (or discards it) and marks it processed for good.

use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use crate::task::{self, NewTask, Priority};
use crate::note;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Task,
    Note,
    Trash,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Destination::Task => "task",
            Destination::Note => "note",
            Destination::Trash => "trash",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Destination {
    type Err = LifeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "task" | "tasks" => Ok(Destination::Task),
            "note" | "notes" => Ok(Destination::Note),
            "trash" | "delete" => Ok(Destination::Trash),
            other => Err(LifeError::InvalidInput(format!(
                "unknown destination '{other}': expected task, note or trash"
            ))),
        }
    }
}

/// Where a processed item ended up. `target_id` is the new task or note id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub destination: Destination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Inbox {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub items: Vec<InboxItem>,
}

impl Document for Inbox {
    const FILE: &'static str = "inbox.json";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InboxStats {
    pub total: usize,
    pub pending: usize,
    pub to_tasks: usize,
    pub to_notes: usize,
    pub trashed: usize,
}

impl Inbox {
    pub fn add(&mut self, text: &str) -> Result<&InboxItem> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifeError::InvalidInput("inbox item cannot be empty".into()));
        }
        let id = self.next_id.next(self.items.iter().map(|i| i.id));
        self.items.push(InboxItem {
            id,
            text: text.to_string(),
            created_at: Utc::now(),
            processed: false,
            processed_at: None,
            outcome: None,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn pending(&self) -> Vec<&InboxItem> {
        self.items.iter().filter(|i| !i.processed).collect()
    }

    pub fn get(&self, id: u64) -> Result<&InboxItem> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| LifeError::not_found("inbox item", id))
    }

    /// Flip an item to processed. Fails if it already was: the flag is one-way.
    pub fn mark_processed(&mut self, id: u64, outcome: Outcome) -> Result<&InboxItem> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| LifeError::not_found("inbox item", id))?;
        if item.processed {
            return Err(LifeError::InvalidTransition {
                kind: "inbox item",
                id: id.to_string(),
                reason: "already processed".into(),
            });
        }
        item.processed = true;
        item.processed_at = Some(Utc::now());
        item.outcome = Some(outcome);
        Ok(&*item)
    }

    /// Drop processed items. Returns how many were removed.
    pub fn clear_processed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| !i.processed);
        before - self.items.len()
    }

    pub fn stats(&self) -> InboxStats {
        let count = |d: Destination| {
            self.items
                .iter()
                .filter(|i| i.outcome.as_ref().is_some_and(|o| o.destination == d))
                .count()
        };
        InboxStats {
            total: self.items.len(),
            pending: self.items.iter().filter(|i| !i.processed).count(),
            to_tasks: count(Destination::Task),
            to_notes: count(Destination::Note),
            trashed: count(Destination::Trash),
        }
    }
}

pub fn load(home: &Path) -> Result<Inbox> {
    store::load(home)
}

/// Route an item to its destination, creating the task or note first so a
/// failure there leaves the item pending.
pub fn process(
    home: &Path,
    id: u64,
    destination: Destination,
    priority: Option<Priority>,
) -> Result<InboxItem> {
    store::update(home, |inbox: &mut Inbox| {
        let item = inbox.get(id)?;
        if item.processed {
            return Err(LifeError::InvalidTransition {
                kind: "inbox item",
                id: id.to_string(),
                reason: "already processed".into(),
            });
        }
        let text = item.text.clone();
        let target_id = match destination {
            Destination::Task => Some(
                task::add(
                    home,
                    NewTask {
                        title: text,
                        priority: priority.unwrap_or_default(),
                        ..Default::default()
                    },
                )?
                .id,
            ),
            Destination::Note => Some(note::add(home, &text, &["inbox".to_string()])?.id),
            Destination::Trash => None,
        };
        tracing::debug!(id, %destination, ?target_id, "processed inbox item");
        inbox
            .mark_processed(
                id,
                Outcome {
                    destination,
                    target_id,
                },
            )
            .cloned()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn process_to_task_creates_task() {
        let dir = TempDir::new().unwrap();
        store::update(dir.path(), |i: &mut Inbox| i.add("renew passport").map(|_| ())).unwrap();
        let item = process(dir.path(), 1, Destination::Task, Some(Priority::High)).unwrap();
        let outcome = item.outcome.unwrap();
        assert_eq!(outcome.destination, Destination::Task);

        let tasks = task::load(dir.path()).unwrap();
        assert_eq!(tasks.tasks.len(), 1);
        assert_eq!(tasks.tasks[0].title, "renew passport");
        assert_eq!(tasks.tasks[0].priority, Priority::High);
        assert_eq!(Some(tasks.tasks[0].id), outcome.target_id);
    }

    #[test]
    fn process_to_note_tags_inbox() {
        let dir = TempDir::new().unwrap();
        store::update(dir.path(), |i: &mut Inbox| i.add("podcast idea").map(|_| ())).unwrap();
        process(dir.path(), 1, Destination::Note, None).unwrap();
        let notes = note::load(dir.path()).unwrap();
        assert_eq!(notes.notes[0].tags, vec!["inbox"]);
    }

    #[test]
    fn processed_is_one_way() {
        let dir = TempDir::new().unwrap();
        store::update(dir.path(), |i: &mut Inbox| i.add("x").map(|_| ())).unwrap();
        process(dir.path(), 1, Destination::Trash, None).unwrap();
        let err = process(dir.path(), 1, Destination::Task, None).unwrap_err();
        assert!(matches!(err, LifeError::InvalidTransition { .. }));
        // No task was created by the rejected second attempt.
        assert!(task::load(dir.path()).unwrap().tasks.is_empty());
    }

    #[test]
    fn clear_processed_and_stats() {
        let mut inbox = Inbox::default();
        inbox.add("a").unwrap();
        inbox.add("b").unwrap();
        inbox
            .mark_processed(
                1,
                Outcome {
                    destination: Destination::Trash,
                    target_id: None,
                },
            )
            .unwrap();
        let stats = inbox.stats();
        assert_eq!((stats.total, stats.pending, stats.trashed), (2, 1, 1));
        assert_eq!(inbox.clear_processed(), 1);
        assert_eq!(inbox.pending().len(), 1);
        // Counter survives the clear.
        assert_eq!(inbox.add("c").unwrap().id, 3);
    }

    #[test]
    fn destination_parsing() {
        assert_eq!("Task".parse::<Destination>().unwrap(), Destination::Task);
        assert!("email".parse::<Destination>().is_err());
    }
}
