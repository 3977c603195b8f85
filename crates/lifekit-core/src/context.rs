//! Work contexts: a named bundle of directory, notes and open threads that
//! can be switched to. Every switch is logged so time per context can be
//! derived afterwards.

use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    pub context: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContextBook {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(default)]
    pub history: Vec<Switch>,
}

impl Document for ContextBook {
    const FILE: &'static str = "contexts.json";
}

#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub directory: Option<PathBuf>,
    pub notes: Option<String>,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextTime {
    pub context: String,
    pub switches: usize,
    pub minutes: i64,
}

impl ContextBook {
    /// Create a context, or update an existing one with the same name.
    /// Returns `true` when a new context was created.
    pub fn save(&mut self, name: &str, update: ContextUpdate) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LifeError::InvalidInput("context name cannot be empty".into()));
        }
        let tasks: Vec<String> = update
            .tasks
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if let Some(ctx) = self
            .contexts
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            if update.directory.is_some() {
                ctx.directory = update.directory;
            }
            if update.notes.is_some() {
                ctx.notes = update.notes;
            }
            for t in tasks {
                if !ctx.tasks.contains(&t) {
                    ctx.tasks.push(t);
                }
            }
            return Ok(false);
        }
        let id = self.next_id.next(self.contexts.iter().map(|c| c.id));
        self.contexts.push(Context {
            id,
            name: name.to_string(),
            directory: update.directory,
            notes: update.notes,
            tasks,
            created_at: Utc::now(),
            last_used: None,
        });
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Result<&Context> {
        let name = name.trim();
        self.contexts
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| LifeError::not_found("context", name))
    }

    pub fn current(&self) -> Option<&Context> {
        self.current.as_deref().and_then(|n| self.get(n).ok())
    }

    /// Make `name` current and log the switch. Switching to the context that
    /// is already current is a no-op and returns `false`.
    pub fn switch(&mut self, name: &str, at: DateTime<Utc>) -> Result<bool> {
        let canonical = self.get(name)?.name.clone();
        if self.current.as_deref() == Some(canonical.as_str()) {
            return Ok(false);
        }
        if let Some(ctx) = self.contexts.iter_mut().find(|c| c.name == canonical) {
            ctx.last_used = Some(at);
        }
        self.history.push(Switch {
            context: canonical.clone(),
            at,
        });
        self.current = Some(canonical);
        Ok(true)
    }

    pub fn remove(&mut self, name: &str) -> Result<Context> {
        let name = name.trim();
        let pos = self
            .contexts
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| LifeError::not_found("context", name))?;
        let removed = self.contexts.remove(pos);
        if self.current.as_deref() == Some(removed.name.as_str()) {
            self.current = None;
        }
        Ok(removed)
    }

    /// Minutes spent per context, measured between consecutive switches.
    /// The current context accrues time up to `now`. Once the current
    /// context is removed, the last switch stops accruing.
    pub fn time_per_context(&self, now: DateTime<Utc>) -> Vec<ContextTime> {
        let mut totals: BTreeMap<&str, (usize, Duration)> = BTreeMap::new();
        for (i, s) in self.history.iter().enumerate() {
            let end = match self.history.get(i + 1) {
                Some(next) => next.at,
                None if self.current.is_some() => now,
                None => s.at,
            };
            let span = (end - s.at).max(Duration::zero());
            let entry = totals.entry(s.context.as_str()).or_insert((0, Duration::zero()));
            entry.0 += 1;
            entry.1 += span;
        }
        let mut out: Vec<ContextTime> = totals
            .into_iter()
            .map(|(context, (switches, d))| ContextTime {
                context: context.to_string(),
                switches,
                minutes: d.num_minutes(),
            })
            .collect();
        out.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.context.cmp(&b.context)));
        out
    }
}

pub fn load(home: &Path) -> Result<ContextBook> {
    store::load(home)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn save_creates_then_updates() {
        let mut book = ContextBook::default();
        assert!(book
            .save(
                "client-a",
                ContextUpdate {
                    directory: Some("/work/a".into()),
                    tasks: vec!["review PR".into()],
                    ..Default::default()
                }
            )
            .unwrap());
        assert!(!book
            .save(
                "Client-A",
                ContextUpdate {
                    notes: Some("waiting on feedback".into()),
                    tasks: vec!["review PR".into(), "invoice".into()],
                    ..Default::default()
                }
            )
            .unwrap());
        let ctx = book.get("client-a").unwrap();
        assert_eq!(ctx.directory.as_deref(), Some(Path::new("/work/a")));
        assert_eq!(ctx.notes.as_deref(), Some("waiting on feedback"));
        assert_eq!(ctx.tasks, vec!["review PR", "invoice"]);
        assert_eq!(book.contexts.len(), 1);
    }

    #[test]
    fn switch_logs_history() {
        let mut book = ContextBook::default();
        book.save("a", ContextUpdate::default()).unwrap();
        book.save("b", ContextUpdate::default()).unwrap();
        assert!(book.switch("a", at("2024-01-01T09:00:00Z")).unwrap());
        assert!(!book.switch("A", at("2024-01-01T09:05:00Z")).unwrap());
        assert!(book.switch("b", at("2024-01-01T10:00:00Z")).unwrap());
        assert_eq!(book.history.len(), 2);
        assert_eq!(book.current().unwrap().name, "b");
        assert!(book.switch("c", at("2024-01-01T11:00:00Z")).is_err());
    }

    #[test]
    fn time_between_switches() {
        let mut book = ContextBook::default();
        book.save("a", ContextUpdate::default()).unwrap();
        book.save("b", ContextUpdate::default()).unwrap();
        book.switch("a", at("2024-01-01T09:00:00Z")).unwrap();
        book.switch("b", at("2024-01-01T10:30:00Z")).unwrap();
        book.switch("a", at("2024-01-01T11:00:00Z")).unwrap();
        let times = book.time_per_context(at("2024-01-01T11:15:00Z"));
        assert_eq!(times[0].context, "a");
        assert_eq!(times[0].minutes, 105);
        assert_eq!(times[0].switches, 2);
        assert_eq!(times[1].minutes, 30);
    }

    #[test]
    fn removing_current_clears_it() {
        let mut book = ContextBook::default();
        book.save("a", ContextUpdate::default()).unwrap();
        book.switch("a", Utc::now()).unwrap();
        book.remove("a").unwrap();
        assert!(book.current.is_none());
        assert!(book.current().is_none());
    }

    #[test]
    fn removed_current_stops_accruing() {
        let mut book = ContextBook::default();
        book.save("a", ContextUpdate::default()).unwrap();
        book.save("b", ContextUpdate::default()).unwrap();
        book.switch("a", at("2024-01-01T09:00:00Z")).unwrap();
        book.switch("b", at("2024-01-01T10:00:00Z")).unwrap();
        book.remove("b").unwrap();

        let later = book.time_per_context(at("2024-01-01T10:30:00Z"));
        let much_later = book.time_per_context(at("2024-01-02T10:00:00Z"));
        let minutes = |ts: &[ContextTime]| ts.iter().map(|t| t.minutes).collect::<Vec<_>>();
        assert_eq!(minutes(&later), minutes(&much_later));
        let b = later.iter().find(|t| t.context == "b").unwrap();
        assert_eq!(b.minutes, 0);
        assert_eq!(b.switches, 1);
        assert_eq!(later[0].context, "a");
        assert_eq!(later[0].minutes, 60);
    }
}
