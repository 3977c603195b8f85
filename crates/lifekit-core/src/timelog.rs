//! Project time tracking. Finished entries live in `timelog.csv`; the running
//! timer and the id counter live in `timelog-active.json`, whose lock also
//! guards writes to the CSV.

use crate::csvlog;
use crate::dates;
use crate::error::{LifeError, Result};
use crate::paths;
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub date: NaiveDate,
    pub project: String,
    pub minutes: u64,
    #[serde(default)]
    pub note: String,
    /// Set for entries recorded by `start`/`stop`, empty for manual ones.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningTimer {
    pub project: String,
    #[serde(default)]
    pub note: String,
    pub started_at: DateTime<Utc>,
}

impl RunningTimer {
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u64 {
        let secs = (now - self.started_at).num_seconds().max(0) as u64;
        secs / 60
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TimerState {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<RunningTimer>,
}

impl Document for TimerState {
    const FILE: &'static str = paths::TIMELOG_ACTIVE;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Today,
    Week,
    All,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTotal {
    pub project: String,
    pub minutes: u64,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<NaiveDate>,
    pub projects: Vec<ProjectTotal>,
    pub total_minutes: u64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn entries(home: &Path) -> Result<Vec<TimeEntry>> {
    csvlog::read(&paths::timelog_csv(home))
}

pub fn status(home: &Path) -> Result<Option<RunningTimer>> {
    Ok(store::load::<TimerState>(home)?.running)
}

pub fn start(home: &Path, project: &str, note: &str, now: DateTime<Utc>) -> Result<RunningTimer> {
    let project = project.trim();
    if project.is_empty() {
        return Err(LifeError::InvalidInput("project cannot be empty".into()));
    }
    store::update(home, |state: &mut TimerState| {
        if let Some(running) = &state.running {
            return Err(LifeError::InvalidTransition {
                kind: "timer",
                id: running.project.clone(),
                reason: "already running; stop it first".into(),
            });
        }
        let timer = RunningTimer {
            project: project.to_string(),
            note: note.trim().to_string(),
            started_at: now,
        };
        state.running = Some(timer.clone());
        Ok(timer)
    })
}

/// Stop the running timer and record it. Sessions shorter than a minute
/// still count as one.
pub fn stop(home: &Path, now: DateTime<Utc>) -> Result<TimeEntry> {
    store::update(home, |state: &mut TimerState| {
        let timer = state
            .running
            .take()
            .ok_or_else(|| LifeError::InvalidInput("no timer running".into()))?;
        let path = paths::timelog_csv(home);
        let existing: Vec<TimeEntry> = csvlog::read(&path)?;
        let minutes = timer.elapsed_minutes(now).max(1);
        let entry = TimeEntry {
            id: state.next_id.next(existing.iter().map(|e| e.id)),
            date: timer.started_at.with_timezone(&Local).date_naive(),
            project: timer.project,
            minutes,
            note: timer.note,
            started_at: Some(timer.started_at),
        };
        csvlog::append(&path, &entry)?;
        Ok(entry)
    })
}

/// Record time after the fact.
pub fn log(
    home: &Path,
    project: &str,
    minutes: u64,
    date: NaiveDate,
    note: &str,
) -> Result<TimeEntry> {
    let project = project.trim();
    if project.is_empty() {
        return Err(LifeError::InvalidInput("project cannot be empty".into()));
    }
    if minutes == 0 {
        return Err(LifeError::InvalidDuration("0".into()));
    }
    store::update(home, |state: &mut TimerState| {
        let path = paths::timelog_csv(home);
        let existing: Vec<TimeEntry> = csvlog::read(&path)?;
        let entry = TimeEntry {
            id: state.next_id.next(existing.iter().map(|e| e.id)),
            date,
            project: project.to_string(),
            minutes,
            note: note.trim().to_string(),
            started_at: None,
        };
        csvlog::append(&path, &entry)?;
        Ok(entry)
    })
}

pub fn remove(home: &Path, id: u64) -> Result<TimeEntry> {
    store::update(home, |_state: &mut TimerState| {
        let path = paths::timelog_csv(home);
        let mut all: Vec<TimeEntry> = csvlog::read(&path)?;
        let pos = all
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LifeError::not_found("time entry", id))?;
        let removed = all.remove(pos);
        csvlog::write_all(&path, &all)?;
        Ok(removed)
    })
}

/// Minutes per project for entries on or after the start of `range`,
/// largest first.
pub fn report(all: &[TimeEntry], range: Range, today: NaiveDate, monday_first: bool) -> Report {
    let since = match range {
        Range::Today => Some(today),
        Range::Week => Some(dates::week_start(today, monday_first)),
        Range::All => None,
    };
    let mut totals: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for e in all
        .iter()
        .filter(|e| since.map_or(true, |s| e.date >= s && e.date <= today))
    {
        let t = totals.entry(e.project.as_str()).or_default();
        t.0 += e.minutes;
        t.1 += 1;
    }
    let mut projects: Vec<ProjectTotal> = totals
        .into_iter()
        .map(|(project, (minutes, entries))| ProjectTotal {
            project: project.to_string(),
            minutes,
            entries,
        })
        .collect();
    projects.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.project.cmp(&b.project)));
    Report {
        since,
        total_minutes: projects.iter().map(|p| p.minutes).sum(),
        projects,
    }
}

pub fn to_csv(entries: &[TimeEntry]) -> Result<String> {
    Ok(String::from_utf8_lossy(&csvlog::to_bytes(entries)?).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn start_stop_records_entry() {
        let dir = TempDir::new().unwrap();
        let t0 = Utc::now() - Duration::minutes(50);
        start(dir.path(), "lifekit", "docs", t0).unwrap();
        assert!(status(dir.path()).unwrap().is_some());
        let entry = stop(dir.path(), t0 + Duration::minutes(42)).unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.minutes, 42);
        assert_eq!(entry.note, "docs");
        assert!(status(dir.path()).unwrap().is_none());
        assert_eq!(entries(dir.path()).unwrap(), vec![entry]);
    }

    #[test]
    fn double_start_rejected() {
        let dir = TempDir::new().unwrap();
        start(dir.path(), "a", "", Utc::now()).unwrap();
        assert!(matches!(
            start(dir.path(), "b", "", Utc::now()),
            Err(LifeError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn stop_without_timer_fails() {
        let dir = TempDir::new().unwrap();
        assert!(stop(dir.path(), Utc::now()).is_err());
    }

    #[test]
    fn ids_not_reused_after_remove() {
        let dir = TempDir::new().unwrap();
        log(dir.path(), "a", 30, d("2024-03-01"), "").unwrap();
        let second = log(dir.path(), "b", 15, d("2024-03-01"), "call").unwrap();
        remove(dir.path(), second.id).unwrap();
        let third = log(dir.path(), "c", 10, d("2024-03-02"), "").unwrap();
        assert_eq!(third.id, 3);
        let ids: Vec<u64> = entries(dir.path()).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(matches!(remove(dir.path(), 2), Err(LifeError::NotFound { .. })));
    }

    #[test]
    fn report_groups_by_project() {
        let mk = |id, date: &str, project: &str, minutes| TimeEntry {
            id,
            date: d(date),
            project: project.into(),
            minutes,
            note: String::new(),
            started_at: None,
        };
        let all = vec![
            mk(1, "2024-03-04", "a", 30),
            mk(2, "2024-03-05", "b", 90),
            mk(3, "2024-03-06", "a", 45),
            mk(4, "2024-02-20", "a", 600),
        ];
        let today = d("2024-03-06");
        let week = report(&all, Range::Week, today, true);
        assert_eq!(week.since, Some(d("2024-03-04")));
        assert_eq!(week.total_minutes, 165);
        assert_eq!(week.projects[0].project, "b");
        assert_eq!(week.projects[1].minutes, 75);

        let day = report(&all, Range::Today, today, true);
        assert_eq!(day.total_minutes, 45);

        let everything = report(&all, Range::All, today, true);
        assert_eq!(everything.total_minutes, 765);
    }

    #[test]
    fn zero_minutes_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(log(dir.path(), "a", 0, d("2024-01-01"), "").is_err());
    }
}
