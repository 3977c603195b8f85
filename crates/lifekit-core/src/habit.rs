use crate::dates;
use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("daily"),
            Frequency::Weekly => f.write_str("weekly"),
        }
    }
}

// ---------------------------------------------------------------------------
// Habit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub frequency: Frequency,
    /// Completions per week for weekly habits.
    #[serde(default = "default_target")]
    pub target: u32,
    #[serde(default)]
    pub completions: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

fn default_target() -> u32 {
    1
}

impl Habit {
    pub fn done_on(&self, date: NaiveDate) -> bool {
        self.completions.contains(&date)
    }

    /// Daily: consecutive days ending today (or yesterday while today is still
    /// open). Weekly: consecutive weeks meeting the target; the current week
    /// only counts once it is met.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        match self.frequency {
            Frequency::Daily => {
                let mut day = if self.done_on(today) {
                    today
                } else {
                    today - Duration::days(1)
                };
                let mut streak = 0;
                while self.done_on(day) {
                    streak += 1;
                    day -= Duration::days(1);
                }
                streak
            }
            Frequency::Weekly => {
                let mut week = dates::week_start(today, true);
                if self.count_in_week(week) < self.target {
                    week -= Duration::weeks(1);
                }
                let mut streak = 0;
                while self.count_in_week(week) >= self.target {
                    streak += 1;
                    week -= Duration::weeks(1);
                }
                streak
            }
        }
    }

    pub fn best_streak(&self) -> u32 {
        match self.frequency {
            Frequency::Daily => {
                let mut best = 0;
                let mut run = 0;
                let mut prev: Option<NaiveDate> = None;
                for &day in &self.completions {
                    run = match prev {
                        Some(p) if day - p == Duration::days(1) => run + 1,
                        _ => 1,
                    };
                    best = best.max(run);
                    prev = Some(day);
                }
                best
            }
            Frequency::Weekly => {
                let weeks: BTreeSet<NaiveDate> = self
                    .completions
                    .iter()
                    .map(|d| dates::week_start(*d, true))
                    .filter(|w| self.count_in_week(*w) >= self.target)
                    .collect();
                let mut best = 0;
                let mut run = 0;
                let mut prev: Option<NaiveDate> = None;
                for &w in &weeks {
                    run = match prev {
                        Some(p) if w - p == Duration::weeks(1) => run + 1,
                        _ => 1,
                    };
                    best = best.max(run);
                    prev = Some(w);
                }
                best
            }
        }
    }

    fn count_in_week(&self, week_start: NaiveDate) -> u32 {
        let end = week_start + Duration::days(7);
        self.completions.range(week_start..end).count() as u32
    }

    /// Share of the last `days` days (daily) that were completed, as a percentage.
    pub fn completion_rate(&self, today: NaiveDate, days: i64) -> u8 {
        let start = (today - Duration::days(days - 1)).max(self.created_at.date_naive());
        let span = (today - start).num_days() + 1;
        if span <= 0 {
            return 0;
        }
        let done = self.completions.range(start..=today).count() as f64;
        let expected = match self.frequency {
            Frequency::Daily => span as f64,
            Frequency::Weekly => (span as f64 / 7.0).ceil() * self.target as f64,
        };
        ((done / expected).min(1.0) * 100.0).round() as u8
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HabitBook {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

impl Document for HabitBook {
    const FILE: &'static str = "habits.json";
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitSummary {
    pub id: u64,
    pub name: String,
    pub frequency: Frequency,
    pub done_today: bool,
    pub streak: u32,
    pub best_streak: u32,
    pub total: usize,
    pub rate_30d: u8,
    pub archived: bool,
}

impl HabitBook {
    pub fn add(&mut self, name: &str, frequency: Frequency, target: u32) -> Result<&Habit> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LifeError::InvalidInput("habit name cannot be empty".into()));
        }
        if name.parse::<u64>().is_ok() {
            return Err(LifeError::InvalidInput(format!(
                "habit name '{name}' cannot be a bare number"
            )));
        }
        if self.habits.iter().any(|h| h.name.eq_ignore_ascii_case(name)) {
            return Err(LifeError::exists("habit", name));
        }
        let target = match frequency {
            Frequency::Daily => 1,
            Frequency::Weekly if (1..=7).contains(&target) => target,
            Frequency::Weekly => {
                return Err(LifeError::InvalidInput(format!(
                    "invalid weekly target '{target}': expected 1 to 7"
                )))
            }
        };
        let id = self.next_id.next(self.habits.iter().map(|h| h.id));
        self.habits.push(Habit {
            id,
            name: name.to_string(),
            frequency,
            target,
            completions: BTreeSet::new(),
            archived: false,
            created_at: Utc::now(),
        });
        Ok(&self.habits[self.habits.len() - 1])
    }

    /// Resolve a habit by numeric id or case-insensitive name.
    pub fn find(&self, key: &str) -> Result<&Habit> {
        let idx = self.index_of(key)?;
        Ok(&self.habits[idx])
    }

    fn index_of(&self, key: &str) -> Result<usize> {
        let key = key.trim();
        let by_id = key
            .parse::<u64>()
            .ok()
            .and_then(|id| self.habits.iter().position(|h| h.id == id));
        by_id
            .or_else(|| {
                self.habits
                    .iter()
                    .position(|h| h.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| LifeError::not_found("habit", key))
    }

    /// Record a completion. Returns `false` if that date was already recorded.
    pub fn check_in(&mut self, key: &str, date: NaiveDate) -> Result<bool> {
        let idx = self.index_of(key)?;
        let habit = &mut self.habits[idx];
        if habit.archived {
            return Err(LifeError::InvalidTransition {
                kind: "habit",
                id: habit.name.clone(),
                reason: "archived habits cannot be checked in".into(),
            });
        }
        Ok(habit.completions.insert(date))
    }

    /// Remove a completion. Returns `false` if there was none on that date.
    pub fn undo(&mut self, key: &str, date: NaiveDate) -> Result<bool> {
        let idx = self.index_of(key)?;
        Ok(self.habits[idx].completions.remove(&date))
    }

    pub fn archive(&mut self, key: &str) -> Result<bool> {
        let idx = self.index_of(key)?;
        let habit = &mut self.habits[idx];
        if habit.archived {
            return Ok(false);
        }
        habit.archived = true;
        Ok(true)
    }

    pub fn remove(&mut self, key: &str) -> Result<Habit> {
        let idx = self.index_of(key)?;
        Ok(self.habits.remove(idx))
    }

    pub fn summaries(&self, today: NaiveDate, include_archived: bool) -> Vec<HabitSummary> {
        self.habits
            .iter()
            .filter(|h| include_archived || !h.archived)
            .map(|h| summarize(h, today))
            .collect()
    }
}

pub fn summarize(h: &Habit, today: NaiveDate) -> HabitSummary {
    HabitSummary {
        id: h.id,
        name: h.name.clone(),
        frequency: h.frequency,
        done_today: h.done_on(today),
        streak: h.streak(today),
        best_streak: h.best_streak(),
        total: h.completions.len(),
        rate_30d: h.completion_rate(today, 30),
        archived: h.archived,
    }
}

pub fn load(home: &Path) -> Result<HabitBook> {
    store::load(home)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn book_with(name: &str, freq: Frequency, target: u32) -> HabitBook {
        let mut book = HabitBook::default();
        book.add(name, freq, target).unwrap();
        book.habits[0].created_at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        book
    }

    #[test]
    fn daily_streak_counts_back_from_today_or_yesterday() {
        let mut book = book_with("Read", Frequency::Daily, 1);
        for day in ["2024-03-03", "2024-03-04", "2024-03-05"] {
            book.check_in("read", d(day)).unwrap();
        }
        let h = book.find("1").unwrap();
        assert_eq!(h.streak(d("2024-03-05")), 3);
        // Today still open: yesterday's run counts.
        assert_eq!(h.streak(d("2024-03-06")), 3);
        assert_eq!(h.streak(d("2024-03-07")), 0);
        assert_eq!(h.best_streak(), 3);
    }

    #[test]
    fn weekly_streak_needs_target() {
        let mut book = book_with("Gym", Frequency::Weekly, 2);
        // Week of 2024-02-26: two sessions. Week of 2024-03-04: two sessions.
        for day in ["2024-02-27", "2024-02-29", "2024-03-04", "2024-03-06"] {
            book.check_in("gym", d(day)).unwrap();
        }
        let h = book.find("gym").unwrap();
        assert_eq!(h.streak(d("2024-03-07")), 2);
        // Next week, not met yet: still 2.
        assert_eq!(h.streak(d("2024-03-12")), 2);
        assert_eq!(h.best_streak(), 2);
    }

    #[test]
    fn duplicate_check_in_is_noop() {
        let mut book = book_with("Walk", Frequency::Daily, 1);
        assert!(book.check_in("walk", d("2024-03-01")).unwrap());
        assert!(!book.check_in("walk", d("2024-03-01")).unwrap());
        assert_eq!(book.habits[0].completions.len(), 1);
    }

    #[test]
    fn names_unique_and_not_numeric() {
        let mut book = book_with("Walk", Frequency::Daily, 1);
        assert!(matches!(
            book.add("walk", Frequency::Daily, 1),
            Err(LifeError::AlreadyExists { .. })
        ));
        assert!(book.add("42", Frequency::Daily, 1).is_err());
        assert!(book.add("Swim", Frequency::Weekly, 8).is_err());
    }

    #[test]
    fn archive_is_one_way_and_blocks_check_in() {
        let mut book = book_with("Floss", Frequency::Daily, 1);
        assert!(book.archive("floss").unwrap());
        assert!(!book.archive("floss").unwrap());
        assert!(book.check_in("floss", d("2024-03-01")).is_err());
        assert!(book.summaries(d("2024-03-01"), false).is_empty());
        assert_eq!(book.summaries(d("2024-03-01"), true).len(), 1);
    }

    #[test]
    fn completion_rate_bounded_by_creation() {
        let mut book = book_with("Stretch", Frequency::Daily, 1);
        book.check_in("stretch", d("2024-01-01")).unwrap();
        book.check_in("stretch", d("2024-01-02")).unwrap();
        // Created 2024-01-01, so the window is 4 days, 2 done.
        assert_eq!(book.habits[0].completion_rate(d("2024-01-04"), 30), 50);
    }

    #[test]
    fn unknown_habit() {
        let mut book = HabitBook::default();
        assert!(matches!(
            book.check_in("nope", d("2024-01-01")),
            Err(LifeError::NotFound { .. })
        ));
    }
}
