use crate::output::{print_json, print_table, write_export};
use clap::Subcommand;
use lifekit_core::{
    config::Config,
    dates, store, text,
    win::{self, Period, Win, WinLog},
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum WinSubcommand {
    /// Record a win
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Date of the win (default today)
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Wins this week (default), this month or ever
    List {
        #[arg(long, conflicts_with_all = ["month", "all"])]
        week: bool,
        #[arg(long, conflicts_with = "all")]
        month: bool,
        #[arg(long)]
        all: bool,
    },
    /// Search win text and tags
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Delete a win
    Remove { id: u64 },
    /// Totals per period and tag
    Stats,
    /// Export as markdown
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(home: &Path, subcmd: WinSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WinSubcommand::Add { text, tags, date } => add(home, &text, &tags, date.as_deref(), json),
        WinSubcommand::List { week: _, month, all } => {
            let period = if all {
                Period::All
            } else if month {
                Period::Month
            } else {
                Period::Week
            };
            list(home, period, json)
        }
        WinSubcommand::Search { query } => search(home, &query.join(" "), json),
        WinSubcommand::Remove { id } => remove(home, id, json),
        WinSubcommand::Stats => stats(home, json),
        WinSubcommand::Export { output } => export(home, output.as_deref()),
    }
}

fn rows(wins: &[&Win]) -> Vec<Vec<String>> {
    wins.iter()
        .map(|w| {
            vec![
                w.id.to_string(),
                w.date.to_string(),
                text::truncate(&w.text, 60),
                w.tags.join(","),
            ]
        })
        .collect()
}

fn add(
    home: &Path,
    words: &[String],
    tags: &[String],
    date: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let body = text::join_words(words).ok_or_else(|| anyhow::anyhow!("win cannot be empty"))?;
    let date = dates::date_or_today(date)?;
    let win = store::update(home, |log: &mut WinLog| log.add(&body, tags, date).cloned())?;

    if json {
        print_json(&win)?;
    } else {
        println!("Recorded win [{}]: {}", win.id, win.text);
    }
    Ok(())
}

fn list(home: &Path, period: Period, json: bool) -> anyhow::Result<()> {
    let config = Config::load(home)?;
    let log = win::load(home)?;
    let wins = log.in_period(period, dates::today(), config.timelog.week_starts_monday);

    if json {
        print_json(&wins)?;
    } else if wins.is_empty() {
        println!("No wins yet for this period. Go get one.");
    } else {
        print_table(&["ID", "DATE", "WIN", "TAGS"], rows(&wins));
    }
    Ok(())
}

fn search(home: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let log = win::load(home)?;
    let found = log.search(query);

    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        println!("No wins match '{query}'.");
    } else {
        print_table(&["ID", "DATE", "WIN", "TAGS"], rows(&found));
    }
    Ok(())
}

fn remove(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |log: &mut WinLog| log.remove(id))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed win [{id}]");
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(home)?;
    let s = win::load(home)?.stats(dates::today(), config.timelog.week_starts_monday);

    if json {
        print_json(&s)?;
        return Ok(());
    }
    println!("Total:       {}", s.total);
    println!("This week:   {}", s.this_week);
    println!("This month:  {}", s.this_month);
    if !s.by_tag.is_empty() {
        println!();
        let rows = s
            .by_tag
            .iter()
            .map(|(tag, n)| vec![format!("#{tag}"), n.to_string()])
            .collect();
        print_table(&["TAG", "WINS"], rows);
    }
    Ok(())
}

fn export(home: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let log = win::load(home)?;
    write_export(output, &win::to_markdown(&log.entries))
}
