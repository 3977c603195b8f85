use crate::cmd::local_time;
use crate::output::{print_json, print_table};
use chrono::Duration;
use clap::Subcommand;
use lifekit_core::{
    dates,
    habit::{self, Frequency, HabitBook, HabitSummary},
    store, text,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum HabitSubcommand {
    /// Start tracking a habit
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        /// Track per week instead of per day
        #[arg(long)]
        weekly: bool,
        /// Completions per week for weekly habits (1-7)
        #[arg(long, requires = "weekly")]
        target: Option<u32>,
    },
    /// Check in a habit
    Done {
        habit: String,
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Remove a check-in
    Undo {
        habit: String,
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Habits with streaks and today's status
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// History and streaks for one habit
    Show { habit: String },
    /// Summary across all habits
    Stats,
    /// Stop tracking a habit but keep its history
    Archive { habit: String },
    /// Delete a habit and its history
    Remove { habit: String },
}

pub fn run(home: &Path, subcmd: HabitSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        HabitSubcommand::Add {
            name,
            weekly,
            target,
        } => add(home, &name, weekly, target.unwrap_or(1), json),
        HabitSubcommand::Done { habit, date } => check_in(home, &habit, date.as_deref(), json),
        HabitSubcommand::Undo { habit, date } => undo(home, &habit, date.as_deref(), json),
        HabitSubcommand::List { all } => list(home, all, json),
        HabitSubcommand::Show { habit } => show(home, &habit, json),
        HabitSubcommand::Stats => stats(home, json),
        HabitSubcommand::Archive { habit } => archive(home, &habit, json),
        HabitSubcommand::Remove { habit } => remove(home, &habit, json),
    }
}

fn add(home: &Path, words: &[String], weekly: bool, target: u32, json: bool) -> anyhow::Result<()> {
    let name = text::join_words(words)
        .ok_or_else(|| anyhow::anyhow!("habit name cannot be empty"))?;
    let frequency = if weekly {
        Frequency::Weekly
    } else {
        Frequency::Daily
    };
    let h = store::update(home, |book: &mut HabitBook| {
        book.add(&name, frequency, target).cloned()
    })?;

    if json {
        print_json(&h)?;
    } else if weekly {
        println!("Tracking habit [{}]: {} ({}x per week)", h.id, h.name, h.target);
    } else {
        println!("Tracking habit [{}]: {} (daily)", h.id, h.name);
    }
    Ok(())
}

fn check_in(home: &Path, key: &str, date: Option<&str>, json: bool) -> anyhow::Result<()> {
    let date = dates::date_or_today(date)?;
    let (added, summary) = store::update(home, |book: &mut HabitBook| {
        let added = book.check_in(key, date)?;
        Ok((added, habit::summarize(book.find(key)?, dates::today())))
    })?;

    if json {
        print_json(&serde_json::json!({ "habit": summary, "date": date, "recorded": added }))?;
    } else if added {
        println!("Checked in '{}' for {date}. Streak: {}", summary.name, summary.streak);
    } else {
        println!("'{}' was already done on {date}", summary.name);
    }
    Ok(())
}

fn undo(home: &Path, key: &str, date: Option<&str>, json: bool) -> anyhow::Result<()> {
    let date = dates::date_or_today(date)?;
    let (removed, name) = store::update(home, |book: &mut HabitBook| {
        let removed = book.undo(key, date)?;
        Ok((removed, book.find(key)?.name.clone()))
    })?;

    if json {
        print_json(&serde_json::json!({ "habit": name, "date": date, "removed": removed }))?;
    } else if removed {
        println!("Removed check-in for '{name}' on {date}");
    } else {
        println!("'{name}' had no check-in on {date}");
    }
    Ok(())
}

fn rows(summaries: &[HabitSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            let unit = match s.frequency {
                Frequency::Daily => "d",
                Frequency::Weekly => "w",
            };
            vec![
                s.id.to_string(),
                if s.done_today { "x".into() } else { " ".into() },
                s.name.clone(),
                s.frequency.to_string(),
                format!("{}{unit}", s.streak),
                format!("{}{unit}", s.best_streak),
                format!("{}%", s.rate_30d),
                if s.archived { "archived".into() } else { String::new() },
            ]
        })
        .collect()
}

fn list(home: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let book = habit::load(home)?;
    let summaries = book.summaries(dates::today(), all);

    if json {
        print_json(&summaries)?;
    } else if summaries.is_empty() {
        println!("No habits. Add one with `lk habit add <name>`.");
    } else {
        print_table(
            &["ID", "TODAY", "HABIT", "FREQ", "STREAK", "BEST", "30D", ""],
            rows(&summaries),
        );
    }
    Ok(())
}

fn show(home: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let book = habit::load(home)?;
    let h = book.find(key)?;
    let today = dates::today();
    let summary = habit::summarize(h, today);

    if json {
        print_json(&serde_json::json!({ "habit": h, "summary": summary }))?;
        return Ok(());
    }
    println!("[{}] {}", h.id, h.name);
    match h.frequency {
        Frequency::Daily => println!("Frequency:    daily"),
        Frequency::Weekly => println!("Frequency:    weekly, {}x per week", h.target),
    }
    println!("Created:      {}", local_time(h.created_at));
    println!("Streak:       {}", summary.streak);
    println!("Best streak:  {}", summary.best_streak);
    println!("Check-ins:    {}", summary.total);
    println!("Last 30 days: {}%", summary.rate_30d);
    if h.archived {
        println!("Status:       archived");
    }
    let grid: String = (0..14)
        .rev()
        .map(|i| {
            if h.done_on(today - Duration::days(i)) {
                '#'
            } else {
                '.'
            }
        })
        .collect();
    println!("Last 14 days: {grid}");
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let book = habit::load(home)?;
    let summaries = book.summaries(dates::today(), false);
    let done_today = summaries.iter().filter(|s| s.done_today).count();
    let best = summaries.iter().max_by_key(|s| s.streak);
    let check_ins: usize = book.habits.iter().map(|h| h.completions.len()).sum();

    if json {
        print_json(&serde_json::json!({
            "active": summaries.len(),
            "archived": book.habits.len() - summaries.len(),
            "done_today": done_today,
            "check_ins": check_ins,
            "best_current_streak": best.map(|s| {
                serde_json::json!({ "habit": s.name, "streak": s.streak })
            }),
        }))?;
        return Ok(());
    }
    println!("Active habits:  {}", summaries.len());
    println!("Archived:       {}", book.habits.len() - summaries.len());
    println!("Done today:     {done_today}/{}", summaries.len());
    println!("Check-ins:      {check_ins}");
    if let Some(s) = best.filter(|s| s.streak > 0) {
        println!("Best streak:    {} ({})", s.name, s.streak);
    }
    Ok(())
}

fn archive(home: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let (changed, name) = store::update(home, |book: &mut HabitBook| {
        let changed = book.archive(key)?;
        Ok((changed, book.find(key)?.name.clone()))
    })?;

    if json {
        print_json(&serde_json::json!({ "habit": name, "archived": true, "changed": changed }))?;
    } else if changed {
        println!("Archived habit '{name}'");
    } else {
        println!("Habit '{name}' is already archived");
    }
    Ok(())
}

fn remove(home: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |book: &mut HabitBook| book.remove(key))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed habit [{}]: {}", removed.id, removed.name);
    }
    Ok(())
}
