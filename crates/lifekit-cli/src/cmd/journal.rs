use crate::output::{or_dash, print_json, print_table, write_export};
use clap::Subcommand;
use lifekit_core::{
    config::Config,
    dates,
    journal::{self, Entry, Journal},
    store, text,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum JournalSubcommand {
    /// Write an entry
    Write {
        #[arg(required = true)]
        text: Vec<String>,
        /// Entry date (default today)
        #[arg(long, short)]
        date: Option<String>,
        /// Mood from 1 (low) to 5 (great)
        #[arg(long, short)]
        mood: Option<u8>,
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// Today's entries
    Today,
    /// Entries for a date
    Show { date: String },
    /// Entries newest first
    List {
        /// Restrict to a month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },
    /// Search entry text and tags
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Delete an entry
    Remove { id: u64 },
    /// Print a random writing prompt
    Prompt,
    /// Entries, writing streak and average mood
    Stats,
    /// Export as markdown grouped by date
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(home: &Path, subcmd: JournalSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        JournalSubcommand::Write {
            text,
            date,
            mood,
            tags,
        } => write(home, &text, date.as_deref(), mood, &tags, json),
        JournalSubcommand::Today => show(home, &dates::today().to_string(), json),
        JournalSubcommand::Show { date } => show(home, &date, json),
        JournalSubcommand::List { month, limit } => list(home, month.as_deref(), limit, json),
        JournalSubcommand::Search { query } => search(home, &query.join(" "), json),
        JournalSubcommand::Remove { id } => remove(home, id, json),
        JournalSubcommand::Prompt => prompt(home, json),
        JournalSubcommand::Stats => stats(home, json),
        JournalSubcommand::Export { output } => export(home, output.as_deref()),
    }
}

fn write(
    home: &Path,
    words: &[String],
    date: Option<&str>,
    mood: Option<u8>,
    tags: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let body = text::join_words(words)
        .ok_or_else(|| anyhow::anyhow!("journal entry cannot be empty"))?;
    let date = dates::date_or_today(date)?;
    let entry = store::update(home, |j: &mut Journal| {
        j.write(date, &body, mood, tags).cloned()
    })?;

    if json {
        print_json(&entry)?;
    } else {
        println!("Journal entry [{}] saved for {}", entry.id, entry.date);
    }
    Ok(())
}

fn print_entries(entries: &[&Entry]) {
    for (i, e) in entries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let mood = e.mood.map(|m| format!("  mood {m}/5")).unwrap_or_default();
        println!("[{}] {}{mood}", e.id, e.date.format("%A, %B %-d, %Y"));
        println!("{}", e.text);
        if !e.tags.is_empty() {
            let tags: Vec<String> = e.tags.iter().map(|t| format!("#{t}")).collect();
            println!("{}", tags.join(" "));
        }
    }
}

fn show(home: &Path, date: &str, json: bool) -> anyhow::Result<()> {
    let date = dates::parse_date(date)?;
    let j = journal::load(home)?;
    let entries = j.on(date);

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        println!("No entries for {date}.");
    } else {
        print_entries(&entries);
    }
    Ok(())
}

fn list(home: &Path, month: Option<&str>, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let month = month.map(dates::parse_month).transpose()?;
    let j = journal::load(home)?;
    let entries = j.list(month, limit);

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        println!("No journal entries.");
    } else {
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    or_dash(e.mood),
                    text::truncate(&e.text, 60),
                ]
            })
            .collect();
        print_table(&["ID", "DATE", "MOOD", "ENTRY"], rows);
    }
    Ok(())
}

fn search(home: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let j = journal::load(home)?;
    let found = j.search(query);

    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        println!("No entries match '{query}'.");
    } else {
        print_entries(&found);
    }
    Ok(())
}

fn remove(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |j: &mut Journal| j.remove(id))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed journal entry [{id}] from {}", removed.date);
    }
    Ok(())
}

fn prompt(home: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(home)?;
    let p = journal::random_prompt(&config.journal.prompts);

    if json {
        print_json(&serde_json::json!({ "prompt": p }))?;
    } else {
        println!("{p}");
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let s = journal::load(home)?.stats(dates::today());

    if json {
        print_json(&s)?;
    } else {
        println!("Entries:         {}", s.entries);
        println!("Days written:    {}", s.days_written);
        println!("Current streak:  {} day(s)", s.current_streak);
        println!("Longest streak:  {} day(s)", s.longest_streak);
        println!(
            "Average mood:    {}",
            s.average_mood
                .map(|m| format!("{m:.1}/5"))
                .unwrap_or_else(|| "-".into())
        );
        println!("Words:           {}", s.words);
    }
    Ok(())
}

fn export(home: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let j = journal::load(home)?;
    write_export(output, &journal::to_markdown(&j.entries))
}
