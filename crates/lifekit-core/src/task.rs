use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use crate::text;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = LifeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            _ => Err(LifeError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.done && self.due.is_some_and(|d| d < today)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Document for TaskList {
    const FILE: &'static str = "tasks.json";
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    Open,
    Done,
    All,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub open: usize,
    pub done: usize,
    pub overdue: usize,
    pub high: usize,
    pub completion_rate: u8,
}

// ---------------------------------------------------------------------------
// List operations (operate on a TaskList in memory)
// ---------------------------------------------------------------------------

impl TaskList {
    pub fn add(&mut self, new: NewTask) -> Result<&Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(LifeError::InvalidInput("task title cannot be empty".into()));
        }
        let id = self.next_id.next(self.tasks.iter().map(|t| t.id));
        self.tasks.push(Task {
            id,
            title: title.to_string(),
            priority: new.priority,
            due: new.due,
            tags: text::normalize_tags(&new.tags),
            done: false,
            created_at: Utc::now(),
            completed_at: None,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn get(&self, id: u64) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| LifeError::not_found("task", id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LifeError::not_found("task", id))
    }

    /// Mark done. Returns `false` if it already was.
    pub fn complete(&mut self, id: u64) -> Result<bool> {
        let task = self.get_mut(id)?;
        if task.done {
            return Ok(false);
        }
        task.done = true;
        task.completed_at = Some(Utc::now());
        Ok(true)
    }

    /// Re-open a completed task. Returns `false` if it was already open.
    pub fn reopen(&mut self, id: u64) -> Result<bool> {
        let task = self.get_mut(id)?;
        if !task.done {
            return Ok(false);
        }
        task.done = false;
        task.completed_at = None;
        Ok(true)
    }

    pub fn edit(&mut self, id: u64, edit: TaskEdit) -> Result<&Task> {
        let task = self.get_mut(id)?;
        if let Some(title) = edit.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(LifeError::InvalidInput("task title cannot be empty".into()));
            }
            task.title = title.to_string();
        }
        if let Some(p) = edit.priority {
            task.priority = p;
        }
        if let Some(d) = edit.due {
            task.due = Some(d);
        }
        if let Some(tags) = edit.tags {
            task.tags = text::normalize_tags(&tags);
        }
        Ok(&*task)
    }

    pub fn remove(&mut self, id: u64) -> Result<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LifeError::not_found("task", id))?;
        Ok(self.tasks.remove(pos))
    }

    /// Drop every completed task. Returns how many were removed.
    pub fn clear_done(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.done);
        before - self.tasks.len()
    }

    /// Tasks matching the filter, sorted by priority, then due date
    /// (undated last), then id.
    pub fn filtered(
        &self,
        filter: TaskFilter,
        tag: Option<&str>,
        priority: Option<Priority>,
    ) -> Vec<&Task> {
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| match filter {
                TaskFilter::Open => !t.done,
                TaskFilter::Done => t.done,
                TaskFilter::All => true,
            })
            .filter(|t| tag.map_or(true, |tag| text::has_tag(&t.tags, tag)))
            .filter(|t| priority.map_or(true, |p| t.priority == p))
            .collect();
        out.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| match (a.due, b.due) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }

    pub fn search(&self, query: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| {
                text::matches_any(
                    query,
                    std::iter::once(t.title.as_str()).chain(t.tags.iter().map(String::as_str)),
                )
            })
            .collect()
    }

    pub fn stats(&self, today: NaiveDate) -> TaskStats {
        let total = self.tasks.len();
        let done = self.tasks.iter().filter(|t| t.done).count();
        let open = total - done;
        let overdue = self.tasks.iter().filter(|t| t.is_overdue(today)).count();
        let high = self
            .tasks
            .iter()
            .filter(|t| !t.done && t.priority == Priority::High)
            .count();
        let completion_rate = if total == 0 {
            0
        } else {
            ((done as f64 / total as f64) * 100.0).round() as u8
        };
        TaskStats {
            total,
            open,
            done,
            overdue,
            high,
            completion_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// File-backed API
// ---------------------------------------------------------------------------

pub fn load(home: &Path) -> Result<TaskList> {
    store::load(home)
}

pub fn add(home: &Path, new: NewTask) -> Result<Task> {
    store::update(home, |list: &mut TaskList| list.add(new).cloned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new(title: &str, priority: Priority) -> NewTask {
        NewTask {
            title: title.to_string(),
            priority,
            ..Default::default()
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ids_strictly_increase_across_removals() {
        let mut list = TaskList::default();
        let a = list.add(new("a", Priority::Low)).unwrap().id;
        let b = list.add(new("b", Priority::Low)).unwrap().id;
        list.remove(b).unwrap();
        let c = list.add(new("c", Priority::Low)).unwrap().id;
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[test]
    fn remove_removes_exactly_one() {
        let mut list = TaskList::default();
        for t in ["a", "b", "c"] {
            list.add(new(t, Priority::Medium)).unwrap();
        }
        let removed = list.remove(2).unwrap();
        assert_eq!(removed.title, "b");
        let ids: Vec<u64> = list.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(matches!(list.remove(2), Err(LifeError::NotFound { .. })));
    }

    #[test]
    fn complete_and_reopen() {
        let mut list = TaskList::default();
        let id = list.add(new("ship", Priority::High)).unwrap().id;
        assert!(list.complete(id).unwrap());
        assert!(!list.complete(id).unwrap());
        assert!(list.get(id).unwrap().completed_at.is_some());
        assert!(list.reopen(id).unwrap());
        assert!(!list.get(id).unwrap().done);
    }

    #[test]
    fn empty_title_rejected() {
        let mut list = TaskList::default();
        assert!(list.add(new("   ", Priority::Low)).is_err());
        assert!(list.tasks.is_empty());
    }

    #[test]
    fn filtered_sorts_by_priority_then_due() {
        let mut list = TaskList::default();
        list.add(new("low", Priority::Low)).unwrap();
        list.add(NewTask {
            title: "high later".into(),
            priority: Priority::High,
            due: Some(d("2024-05-02")),
            tags: vec![],
        })
        .unwrap();
        list.add(NewTask {
            title: "high sooner".into(),
            priority: Priority::High,
            due: Some(d("2024-05-01")),
            tags: vec!["work".into()],
        })
        .unwrap();
        let titles: Vec<&str> = list
            .filtered(TaskFilter::Open, None, None)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["high sooner", "high later", "low"]);

        let tagged = list.filtered(TaskFilter::All, Some("WORK"), None);
        assert_eq!(tagged.len(), 1);
    }

    #[test]
    fn priority_parsing() {
        assert_eq!("H".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(LifeError::InvalidPriority(_))
        ));
    }

    #[test]
    fn search_matches_title_and_tags() {
        let mut list = TaskList::default();
        list.add(NewTask {
            title: "Call Mom".into(),
            tags: vec!["family".into()],
            ..Default::default()
        })
        .unwrap();
        list.add(new("Buy milk", Priority::Low)).unwrap();
        assert_eq!(list.search("mom").len(), 1);
        assert_eq!(list.search("FAMI").len(), 1);
        assert_eq!(list.search("zzz").len(), 0);
    }

    #[test]
    fn stats_counts_overdue() {
        let mut list = TaskList::default();
        list.add(NewTask {
            title: "late".into(),
            due: Some(d("2024-01-01")),
            ..Default::default()
        })
        .unwrap();
        let id = list.add(new("done", Priority::High)).unwrap().id;
        list.complete(id).unwrap();
        let stats = list.stats(d("2024-02-01"));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn file_backed_add_persists() {
        let dir = TempDir::new().unwrap();
        let t = add(dir.path(), new("persist me", Priority::Low)).unwrap();
        assert_eq!(t.id, 1);
        let list = load(dir.path()).unwrap();
        assert_eq!(list.tasks[0].title, "persist me");
    }
}
