use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use crate::text;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const BUILTIN_PROMPTS: &[&str] = &[
    "What went well today, and why?",
    "What is one thing you learned today?",
    "What drained your energy today? What gave you energy?",
    "What would make tomorrow great?",
    "Who helped you recently, and how could you thank them?",
    "What are you avoiding right now?",
    "Describe a small moment from today you want to remember.",
    "What decision are you weighing, and what would you tell a friend in your place?",
    "What are three things you are grateful for?",
    "If today had a title, what would it be?",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    pub date: NaiveDate,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Document for Journal {
    const FILE: &'static str = "journal.json";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JournalStats {
    pub entries: usize,
    pub days_written: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub average_mood: Option<f64>,
    pub words: usize,
}

pub fn validate_mood(mood: u8) -> Result<u8> {
    if (1..=5).contains(&mood) {
        Ok(mood)
    } else {
        Err(LifeError::InvalidInput(format!(
            "invalid mood '{mood}': expected 1 (low) to 5 (great)"
        )))
    }
}

impl Journal {
    pub fn write(
        &mut self,
        date: NaiveDate,
        text: &str,
        mood: Option<u8>,
        tags: &[String],
    ) -> Result<&Entry> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifeError::InvalidInput("journal entry cannot be empty".into()));
        }
        let mood = mood.map(validate_mood).transpose()?;
        let id = self.next_id.next(self.entries.iter().map(|e| e.id));
        self.entries.push(Entry {
            id,
            date,
            text: text.to_string(),
            mood,
            tags: text::normalize_tags(tags),
            created_at: Utc::now(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn on(&self, date: NaiveDate) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.date == date).collect()
    }

    /// Entries newest first, optionally restricted to one month.
    pub fn list(&self, month: Option<(i32, u32)>, limit: Option<usize>) -> Vec<&Entry> {
        let mut out: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| month.map_or(true, |(y, m)| e.date.year() == y && e.date.month() == m))
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        out.truncate(limit.unwrap_or(usize::MAX));
        out
    }

    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| {
                text::matches_any(
                    query,
                    std::iter::once(e.text.as_str()).chain(e.tags.iter().map(String::as_str)),
                )
            })
            .collect()
    }

    pub fn remove(&mut self, id: u64) -> Result<Entry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LifeError::not_found("journal entry", id))?;
        Ok(self.entries.remove(pos))
    }

    pub fn stats(&self, today: NaiveDate) -> JournalStats {
        let days: BTreeSet<NaiveDate> = self.entries.iter().map(|e| e.date).collect();
        let moods: Vec<u8> = self.entries.iter().filter_map(|e| e.mood).collect();
        let average_mood = if moods.is_empty() {
            None
        } else {
            let sum: u32 = moods.iter().map(|&m| m as u32).sum();
            Some((sum as f64 / moods.len() as f64 * 10.0).round() / 10.0)
        };
        JournalStats {
            entries: self.entries.len(),
            days_written: days.len(),
            current_streak: current_streak(&days, today),
            longest_streak: longest_streak(&days),
            average_mood,
            words: self
                .entries
                .iter()
                .map(|e| e.text.split_whitespace().count())
                .sum(),
        }
    }
}

/// Consecutive days ending today, or ending yesterday if nothing is written
/// today yet.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

/// Pick a writing prompt; `custom` replaces the built-ins when non-empty.
pub fn random_prompt(custom: &[String]) -> String {
    let mut rng = rand::thread_rng();
    if custom.is_empty() {
        BUILTIN_PROMPTS
            .choose(&mut rng)
            .map(|p| p.to_string())
            .unwrap_or_default()
    } else {
        custom.choose(&mut rng).cloned().unwrap_or_default()
    }
}

pub fn load(home: &Path) -> Result<Journal> {
    store::load(home)
}

/// Markdown grouped by date, oldest first.
pub fn to_markdown(entries: &[Entry]) -> String {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Entry>> = BTreeMap::new();
    for e in entries {
        by_date.entry(e.date).or_default().push(e);
    }
    let mut out = String::from("# Journal\n");
    for (date, entries) in by_date {
        out.push_str(&format!("\n## {}\n", date.format("%A, %B %-d, %Y")));
        for e in entries {
            out.push('\n');
            if let Some(mood) = e.mood {
                out.push_str(&format!("_Mood: {mood}/5_\n\n"));
            }
            out.push_str(&e.text);
            out.push('\n');
            if !e.tags.is_empty() {
                let tags: Vec<String> = e.tags.iter().map(|t| format!("#{t}")).collect();
                out.push_str(&format!("\n{}\n", tags.join(" ")));
            }
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

    #[test]
    fn write_validates_mood() {
        let mut j = Journal::default();
        assert!(j.write(d("2024-01-01"), "hello", Some(6), &[]).is_err());
        assert!(j.write(d("2024-01-01"), "hello", Some(0), &[]).is_err());
        assert!(j.entries.is_empty());
        j.write(d("2024-01-01"), "hello", Some(4), &[]).unwrap();
        assert_eq!(j.entries[0].mood, Some(4));
    }

    #[test]
    fn streaks() {
        let mut j = Journal::default();
        for day in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-05", "2024-01-06"] {
            j.write(d(day), "entry", None, &[]).unwrap();
        }
        let stats = j.stats(d("2024-01-07"));
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.days_written, 5);
        // A gap of two days breaks the current streak.
        assert_eq!(j.stats(d("2024-01-08")).current_streak, 0);
    }

    #[test]
    fn average_mood_skips_missing() {
        let mut j = Journal::default();
        j.write(d("2024-01-01"), "a", Some(3), &[]).unwrap();
        j.write(d("2024-01-02"), "b", None, &[]).unwrap();
        j.write(d("2024-01-03"), "c", Some(4), &[]).unwrap();
        assert_eq!(j.stats(d("2024-01-03")).average_mood, Some(3.5));
    }

    #[test]
    fn list_by_month_newest_first() {
        let mut j = Journal::default();
        j.write(d("2024-01-31"), "jan", None, &[]).unwrap();
        j.write(d("2024-02-01"), "feb 1", None, &[]).unwrap();
        j.write(d("2024-02-10"), "feb 10", None, &[]).unwrap();
        let feb = j.list(Some((2024, 2)), None);
        assert_eq!(feb.len(), 2);
        assert_eq!(feb[0].text, "feb 10");
        assert_eq!(j.list(None, Some(1)).len(), 1);
    }

    #[test]
    fn prompts_come_from_custom_list() {
        let custom = vec!["only prompt".to_string()];
        assert_eq!(random_prompt(&custom), "only prompt");
        assert!(BUILTIN_PROMPTS.contains(&random_prompt(&[]).as_str()));
    }

    #[test]
    fn markdown_includes_mood_and_tags() {
        let mut j = Journal::default();
        j.write(d("2024-01-01"), "New year", Some(5), &["reflection".into()])
            .unwrap();
        let md = to_markdown(&j.entries);
        assert!(md.contains("Monday, January 1, 2024"));
        assert!(md.contains("_Mood: 5/5_"));
        assert!(md.contains("#reflection"));
    }
}
