//! Pomodoro-style focus sessions.
//!
//! The running session is kept in `focus-active.json`; finished sessions are
//! appended to `focus-history.csv`. The end-of-session notification is sent by
//! a detached child process that the CLI spawns on `start`.

use crate::csvlog;
use crate::error::{LifeError, Result};
use crate::paths;
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MAX_MINUTES: u32 = 240;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    #[serde(default)]
    pub label: String,
    pub planned_minutes: u32,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(self.planned_minutes as i64)
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        ((now - self.started_at).num_seconds().max(0) / 60) as u32
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.ends_at() - now).num_seconds().max(0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FocusState {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Session>,
}

impl Document for FocusState {
    const FILE: &'static str = paths::FOCUS_ACTIVE;
}

/// One row of `focus-history.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusRecord {
    pub id: u64,
    pub date: NaiveDate,
    #[serde(default)]
    pub label: String,
    pub planned_minutes: u32,
    pub actual_minutes: u32,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FocusStats {
    pub today_sessions: usize,
    pub today_minutes: u64,
    pub sessions: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub total_minutes: u64,
}

pub fn validate_minutes(minutes: u32) -> Result<u32> {
    if minutes == 0 || minutes > MAX_MINUTES {
        return Err(LifeError::InvalidInput(format!(
            "invalid session length {minutes}: expected 1 to {MAX_MINUTES} minutes"
        )));
    }
    Ok(minutes)
}

pub fn status(home: &Path) -> Result<Option<Session>> {
    Ok(store::load::<FocusState>(home)?.active)
}

pub fn start(home: &Path, minutes: u32, label: &str, now: DateTime<Utc>) -> Result<Session> {
    let minutes = validate_minutes(minutes)?;
    store::update(home, |state: &mut FocusState| {
        if let Some(active) = &state.active {
            return Err(LifeError::InvalidTransition {
                kind: "focus session",
                id: active.id.to_string(),
                reason: "a session is already running; stop it first".into(),
            });
        }
        let history: Vec<FocusRecord> = csvlog::read(&paths::focus_history_csv(home))?;
        let session = Session {
            id: state.next_id.next(history.iter().map(|r| r.id)),
            label: label.trim().to_string(),
            planned_minutes: minutes,
            started_at: now,
        };
        state.active = Some(session.clone());
        Ok(session)
    })
}

/// End the running session and append it to the history.
pub fn stop(home: &Path, now: DateTime<Utc>) -> Result<FocusRecord> {
    store::update(home, |state: &mut FocusState| {
        let session = state
            .active
            .take()
            .ok_or_else(|| LifeError::InvalidInput("no focus session running".into()))?;
        let actual = session.elapsed_minutes(now);
        let record = FocusRecord {
            id: session.id,
            date: session.started_at.with_timezone(&Local).date_naive(),
            label: session.label,
            planned_minutes: session.planned_minutes,
            actual_minutes: actual,
            completed: actual >= session.planned_minutes,
            started_at: session.started_at,
            ended_at: now,
        };
        csvlog::append(&paths::focus_history_csv(home), &record)?;
        Ok(record)
    })
}

pub fn history(home: &Path) -> Result<Vec<FocusRecord>> {
    csvlog::read(&paths::focus_history_csv(home))
}

pub fn stats(records: &[FocusRecord], today: NaiveDate) -> FocusStats {
    let completed = records.iter().filter(|r| r.completed).count();
    let todays: Vec<&FocusRecord> = records.iter().filter(|r| r.date == today).collect();
    FocusStats {
        today_sessions: todays.len(),
        today_minutes: todays.iter().map(|r| r.actual_minutes as u64).sum(),
        sessions: records.len(),
        completed,
        completion_rate: if records.is_empty() {
            0.0
        } else {
            completed as f64 / records.len() as f64 * 100.0
        },
        total_minutes: records.iter().map(|r| r.actual_minutes as u64).sum(),
    }
}

/// Whether the session the notifier was spawned for is still the active one.
/// A stopped or replaced session must not be announced.
pub fn still_running(home: &Path, session_id: u64) -> Result<bool> {
    Ok(status(home)?.is_some_and(|s| s.id == session_id))
}

// ---------------------------------------------------------------------------
// Desktop notification
// ---------------------------------------------------------------------------

fn find_notify_send() -> Result<PathBuf> {
    which::which("notify-send").map_err(|_| LifeError::MissingDependency("notify-send".into()))
}

/// Send a desktop notification. Returns `MissingDependency` when
/// `notify-send` is not installed so the caller can fall back.
pub fn send_notification(title: &str, body: &str) -> Result<()> {
    let binary = find_notify_send()?;
    let status = Command::new(binary)
        .args(["--app-name=lifekit", title, body])
        .status()?;
    if !status.success() {
        tracing::warn!(?status, "notify-send exited with failure");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn start_stop_appends_history() {
        let dir = TempDir::new().unwrap();
        let t0 = Utc::now() - Duration::minutes(30);
        let session = start(dir.path(), 25, "write docs", t0).unwrap();
        assert!(still_running(dir.path(), session.id).unwrap());
        let record = stop(dir.path(), t0 + Duration::minutes(26)).unwrap();
        assert!(record.completed);
        assert_eq!(record.actual_minutes, 26);
        assert!(!still_running(dir.path(), session.id).unwrap());
        assert_eq!(history(dir.path()).unwrap(), vec![record]);
    }

    #[test]
    fn early_stop_is_incomplete() {
        let dir = TempDir::new().unwrap();
        let t0 = Utc::now();
        start(dir.path(), 25, "", t0).unwrap();
        let record = stop(dir.path(), t0 + Duration::minutes(10)).unwrap();
        assert!(!record.completed);
        assert_eq!(record.planned_minutes, 25);
    }

    #[test]
    fn only_one_session_at_a_time() {
        let dir = TempDir::new().unwrap();
        start(dir.path(), 25, "", Utc::now()).unwrap();
        assert!(start(dir.path(), 5, "", Utc::now()).is_err());
        assert!(stop(dir.path(), Utc::now()).is_ok());
        assert!(stop(dir.path(), Utc::now()).is_err());
    }

    #[test]
    fn ids_continue_after_history() {
        let dir = TempDir::new().unwrap();
        let t0 = Utc::now();
        let first = start(dir.path(), 1, "", t0).unwrap();
        stop(dir.path(), t0).unwrap();
        let second = start(dir.path(), 1, "", t0).unwrap();
        assert_eq!(second.id, first.id + 1);
    }

    #[test]
    fn session_length_bounds() {
        assert!(validate_minutes(0).is_err());
        assert!(validate_minutes(MAX_MINUTES + 1).is_err());
        assert_eq!(validate_minutes(50).unwrap(), 50);
    }

    #[test]
    fn stats_counts_today_and_rate() {
        let now = Utc::now();
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let mk = |id, date: NaiveDate, actual, completed| FocusRecord {
            id,
            date,
            label: String::new(),
            planned_minutes: 25,
            actual_minutes: actual,
            completed,
            started_at: now,
            ended_at: now,
        };
        let records = vec![
            mk(1, today.pred_opt().unwrap(), 25, true),
            mk(2, today, 25, true),
            mk(3, today, 5, false),
            mk(4, today, 30, true),
        ];
        let s = stats(&records, today);
        assert_eq!(s.today_sessions, 3);
        assert_eq!(s.today_minutes, 60);
        assert_eq!(s.sessions, 4);
        assert_eq!(s.completion_rate, 75.0);
        assert_eq!(s.total_minutes, 85);
    }
}
