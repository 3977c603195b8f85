//! Wins log: small accomplishments worth remembering.

use crate::dates;
use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use crate::text;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Win {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WinLog {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub entries: Vec<Win>,
}

impl Document for WinLog {
    const FILE: &'static str = "wins.json";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Week,
    Month,
    All,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WinStats {
    pub total: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub by_tag: BTreeMap<String, usize>,
}

impl WinLog {
    pub fn add(&mut self, text: &str, tags: &[String], date: NaiveDate) -> Result<&Win> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifeError::InvalidInput("win cannot be empty".into()));
        }
        let id = self.next_id.next(self.entries.iter().map(|w| w.id));
        self.entries.push(Win {
            id,
            text: text.to_string(),
            tags: text::normalize_tags(tags),
            date,
            created_at: Utc::now(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<Win> {
        let pos = self
            .entries
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| LifeError::not_found("win", id))?;
        Ok(self.entries.remove(pos))
    }

    /// Wins inside `period` counted back from `today`, newest date first.
    pub fn in_period(&self, period: Period, today: NaiveDate, monday_first: bool) -> Vec<&Win> {
        let from = match period {
            Period::Week => Some(dates::week_start(today, monday_first)),
            Period::Month => Some(dates::month_start(today)),
            Period::All => None,
        };
        let mut out: Vec<&Win> = self
            .entries
            .iter()
            .filter(|w| from.map_or(true, |f| w.date >= f && w.date <= today))
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        out
    }

    pub fn search(&self, query: &str) -> Vec<&Win> {
        self.entries
            .iter()
            .filter(|w| {
                text::matches_any(
                    query,
                    std::iter::once(w.text.as_str()).chain(w.tags.iter().map(String::as_str)),
                )
            })
            .collect()
    }

    pub fn stats(&self, today: NaiveDate, monday_first: bool) -> WinStats {
        let mut by_tag = BTreeMap::new();
        for tag in self.entries.iter().flat_map(|w| w.tags.iter()) {
            *by_tag.entry(tag.clone()).or_insert(0) += 1;
        }
        WinStats {
            total: self.entries.len(),
            this_week: self.in_period(Period::Week, today, monday_first).len(),
            this_month: self.in_period(Period::Month, today, monday_first).len(),
            by_tag,
        }
    }
}

pub fn load(home: &Path) -> Result<WinLog> {
    store::load(home)
}

/// Markdown grouped by date, oldest first.
pub fn to_markdown(wins: &[Win]) -> String {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Win>> = BTreeMap::new();
    for w in wins {
        by_date.entry(w.date).or_default().push(w);
    }
    let mut out = String::from("# Wins\n");
    for (date, wins) in by_date {
        out.push_str(&format!("\n## {}\n\n", date.format("%Y-%m-%d (%A)")));
        for w in wins {
            out.push_str(&format!("- {}", w.text));
            if !w.tags.is_empty() {
                let tags: Vec<String> = w.tags.iter().map(|t| format!("#{t}")).collect();
                out.push_str(&format!(" {}", tags.join(" ")));
            }
            out.push('\n');
        }
    }
    out
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

    fn sample() -> WinLog {
        let mut log = WinLog::default();
        log.add("shipped release", &["work".into()], d("2024-03-06")).unwrap();
        log.add("ran 5k", &["health".into()], d("2024-03-01")).unwrap();
        log.add("fixed bike", &[], d("2024-02-10")).unwrap();
        log
    }

    #[test]
    fn period_filters() {
        let log = sample();
        // 2024-03-07 is a Thursday; week starts Monday 2024-03-04.
        let today = d("2024-03-07");
        assert_eq!(log.in_period(Period::Week, today, true).len(), 1);
        assert_eq!(log.in_period(Period::Month, today, true).len(), 2);
        let all = log.in_period(Period::All, today, true);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "shipped release");
    }

    #[test]
    fn stats_by_tag() {
        let stats = sample().stats(d("2024-03-07"), true);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.this_month, 2);
        assert_eq!(stats.by_tag.get("work"), Some(&1));
    }

    #[test]
    fn search_case_insensitive() {
        let log = sample();
        assert_eq!(log.search("BIKE").len(), 1);
        assert_eq!(log.search("health").len(), 1);
    }

    #[test]
    fn markdown_groups_by_date() {
        let md = to_markdown(&sample().entries);
        assert!(md.starts_with("# Wins"));
        let first = md.find("2024-02-10").unwrap();
        let last = md.find("2024-03-06").unwrap();
        assert!(first < last);
        assert!(md.contains("#work"));
    }

    #[test]
    fn remove_exactly_one() {
        let mut log = sample();
        log.remove(2).unwrap();
        let ids: Vec<u64> = log.entries.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
