use crate::cmd::local_time;
use crate::output::{print_json, print_table, write_export};
use chrono::Utc;
use clap::Subcommand;
use lifekit_core::{
    config::Config,
    dates::{self, format_minutes},
    text,
    timelog::{self, Range},
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum TimelogSubcommand {
    /// Start a timer for a project
    Start {
        project: String,
        /// Optional note
        note: Vec<String>,
    },
    /// Stop the running timer and record the entry
    Stop,
    /// Show the running timer
    Status,
    /// Record time after the fact
    Log {
        project: String,
        /// Duration such as 45m, 1h30m or 90 (minutes)
        duration: String,
        #[arg(long, short)]
        date: Option<String>,
        #[arg(long, short)]
        note: Option<String>,
    },
    /// Recent entries, newest first
    List {
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },
    /// Minutes per project
    Report {
        #[arg(long, conflicts_with_all = ["week", "all"])]
        today: bool,
        #[arg(long, conflicts_with = "all")]
        week: bool,
        #[arg(long)]
        all: bool,
    },
    /// Delete an entry
    Remove { id: u64 },
    /// Export all entries as CSV
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(home: &Path, subcmd: TimelogSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TimelogSubcommand::Start { project, note } => start(home, &project, &note.join(" "), json),
        TimelogSubcommand::Stop => stop(home, json),
        TimelogSubcommand::Status => status(home, json),
        TimelogSubcommand::Log {
            project,
            duration,
            date,
            note,
        } => log(home, &project, &duration, date.as_deref(), note.as_deref(), json),
        TimelogSubcommand::List { limit } => list(home, limit, json),
        TimelogSubcommand::Report { today, week: _, all } => {
            let range = if today {
                Range::Today
            } else if all {
                Range::All
            } else {
                Range::Week
            };
            report(home, range, json)
        }
        TimelogSubcommand::Remove { id } => remove(home, id, json),
        TimelogSubcommand::Export { output } => export(home, output.as_deref()),
    }
}

fn start(home: &Path, project: &str, note: &str, json: bool) -> anyhow::Result<()> {
    let timer = timelog::start(home, project, note, Utc::now())?;

    if json {
        print_json(&timer)?;
    } else {
        println!("Timer started for '{}' at {}", timer.project, local_time(timer.started_at));
    }
    Ok(())
}

fn stop(home: &Path, json: bool) -> anyhow::Result<()> {
    let entry = timelog::stop(home, Utc::now())?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Logged [{}] {} to '{}'",
            entry.id,
            format_minutes(entry.minutes),
            entry.project
        );
    }
    Ok(())
}

fn status(home: &Path, json: bool) -> anyhow::Result<()> {
    let running = timelog::status(home)?;

    if json {
        print_json(&running)?;
        return Ok(());
    }
    match running {
        Some(t) => {
            println!(
                "Tracking '{}' for {} (since {})",
                t.project,
                format_minutes(t.elapsed_minutes(Utc::now())),
                local_time(t.started_at)
            );
            if !t.note.is_empty() {
                println!("Note: {}", t.note);
            }
        }
        None => println!("No timer running."),
    }
    Ok(())
}

fn log(
    home: &Path,
    project: &str,
    duration: &str,
    date: Option<&str>,
    note: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let minutes = dates::parse_duration_minutes(duration)?;
    let date = dates::date_or_today(date)?;
    let entry = timelog::log(home, project, minutes, date, note.unwrap_or(""))?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Logged [{}] {} to '{}' on {}",
            entry.id,
            format_minutes(entry.minutes),
            entry.project,
            entry.date
        );
    }
    Ok(())
}

fn list(home: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let mut entries = timelog::entries(home)?;
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    entries.truncate(limit);

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        println!("No time logged yet.");
    } else {
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    e.project.clone(),
                    format_minutes(e.minutes),
                    text::truncate(&e.note, 40),
                ]
            })
            .collect();
        print_table(&["ID", "DATE", "PROJECT", "TIME", "NOTE"], rows);
    }
    Ok(())
}

fn report(home: &Path, range: Range, json: bool) -> anyhow::Result<()> {
    let config = Config::load(home)?;
    let entries = timelog::entries(home)?;
    let r = timelog::report(
        &entries,
        range,
        dates::today(),
        config.timelog.week_starts_monday,
    );

    if json {
        print_json(&r)?;
        return Ok(());
    }
    match r.since {
        Some(d) => println!("Time since {d}"),
        None => println!("All time"),
    }
    if r.projects.is_empty() {
        println!("Nothing logged.");
        return Ok(());
    }
    let mut rows: Vec<Vec<String>> = r
        .projects
        .iter()
        .map(|p| {
            vec![
                p.project.clone(),
                format_minutes(p.minutes),
                p.entries.to_string(),
            ]
        })
        .collect();
    rows.push(vec!["TOTAL".into(), format_minutes(r.total_minutes), String::new()]);
    print_table(&["PROJECT", "TIME", "ENTRIES"], rows);
    Ok(())
}

fn remove(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = timelog::remove(home, id)?;

    if json {
        print_json(&removed)?;
    } else {
        println!(
            "Removed entry [{id}]: {} on '{}'",
            format_minutes(removed.minutes),
            removed.project
        );
    }
    Ok(())
}

fn export(home: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let entries = timelog::entries(home)?;
    write_export(output, &timelog::to_csv(&entries)?)
}
