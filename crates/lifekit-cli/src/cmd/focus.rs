use crate::cmd::local_time;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use lifekit_core::{
    config::Config,
    dates,
    focus::{self, Session},
    LifeError,
};
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Subcommand)]
pub enum FocusSubcommand {
    /// Start a focus session
    Start {
        /// Session length in minutes (default from config)
        minutes: Option<u32>,
        /// What you are working on
        #[arg(long, short)]
        label: Option<String>,
        /// Do not send a notification when the session ends
        #[arg(long)]
        quiet: bool,
    },
    /// End the running session
    Stop,
    /// Show the running session
    Status,
    /// Past sessions, newest first
    History {
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,
    },
    /// Focus time and completion rate
    Stats,
    /// Wait, then announce the end of a session
    #[command(hide = true)]
    Notify {
        /// Seconds to wait before notifying
        #[arg(long)]
        after: u64,
        #[arg(long, default_value = "")]
        label: String,
        /// Only notify if this session is still running
        #[arg(long)]
        session: Option<u64>,
    },
}

pub fn run(home: &Path, subcmd: FocusSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FocusSubcommand::Start {
            minutes,
            label,
            quiet,
        } => start(home, minutes, label.as_deref().unwrap_or(""), quiet, json),
        FocusSubcommand::Stop => stop(home, json),
        FocusSubcommand::Status => status(home, json),
        FocusSubcommand::History { limit } => history(home, limit, json),
        FocusSubcommand::Stats => stats(home, json),
        FocusSubcommand::Notify {
            after,
            label,
            session,
        } => notify(home, after, &label, session),
    }
}

fn start(
    home: &Path,
    minutes: Option<u32>,
    label: &str,
    quiet: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(home)?;
    let minutes = minutes.unwrap_or(config.focus.default_minutes);
    let session = focus::start(home, minutes, label, Utc::now())?;

    if config.focus.notify && !quiet {
        if let Err(e) = spawn_notifier(home, &session) {
            tracing::warn!(error = %e, "could not start focus notifier");
        }
    }

    if json {
        print_json(&session)?;
    } else {
        let what = if session.label.is_empty() {
            String::new()
        } else {
            format!(" on '{}'", session.label)
        };
        println!(
            "Focus session [{}] started{what}: {} min, ends at {}",
            session.id,
            session.planned_minutes,
            local_time(session.ends_at())
        );
    }
    Ok(())
}

/// Re-run this binary detached as `lk focus notify`. The child is not waited on.
/// Stdout stays attached to the terminal so the bell fallback is visible.
fn spawn_notifier(home: &Path, session: &Session) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("cannot locate the lk executable")?;
    let after = session.remaining_secs(Utc::now());
    let child = Command::new(exe)
        .arg("--home")
        .arg(home)
        .args(["focus", "notify", "--after", &after.to_string()])
        .args(["--label", &session.label])
        .args(["--session", &session.id.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn focus notifier")?;
    tracing::debug!(pid = child.id(), after, "spawned focus notifier");
    Ok(())
}

fn notify(home: &Path, after: u64, label: &str, session: Option<u64>) -> anyhow::Result<()> {
    std::thread::sleep(std::time::Duration::from_secs(after));
    if let Some(id) = session {
        if !focus::still_running(home, id)? {
            return Ok(());
        }
    }
    let body = if label.is_empty() {
        "Focus session complete. Take a break.".to_string()
    } else {
        format!("Focus session complete: {label}. Take a break.")
    };
    match focus::send_notification("Focus", &body) {
        Ok(()) => {}
        Err(LifeError::MissingDependency(_)) => println!("\x07{body}"),
        Err(e) => {
            tracing::warn!(error = %e, "notification failed");
            println!("\x07{body}");
        }
    }
    Ok(())
}

fn stop(home: &Path, json: bool) -> anyhow::Result<()> {
    let record = focus::stop(home, Utc::now())?;

    if json {
        print_json(&record)?;
    } else {
        let verdict = if record.completed { "completed" } else { "stopped early" };
        println!(
            "Focus session [{}] {verdict}: {} of {} min",
            record.id, record.actual_minutes, record.planned_minutes
        );
    }
    Ok(())
}

fn status(home: &Path, json: bool) -> anyhow::Result<()> {
    let active = focus::status(home)?;

    if json {
        print_json(&active)?;
        return Ok(());
    }
    match active {
        Some(s) => {
            let now = Utc::now();
            let remaining = s.remaining_secs(now);
            println!("Session [{}] {}", s.id, s.label);
            println!("Started:   {}", local_time(s.started_at));
            println!("Elapsed:   {} of {} min", s.elapsed_minutes(now), s.planned_minutes);
            if remaining > 0 {
                println!("Remaining: {}m {:02}s", remaining / 60, remaining % 60);
            } else {
                println!("Remaining: time is up, run `lk focus stop`");
            }
        }
        None => println!("No focus session running."),
    }
    Ok(())
}

fn history(home: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let mut records = focus::history(home)?;
    records.reverse();
    records.truncate(limit);

    if json {
        print_json(&records)?;
    } else if records.is_empty() {
        println!("No focus sessions yet.");
    } else {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    local_time(r.started_at),
                    format!("{}/{}", r.actual_minutes, r.planned_minutes),
                    if r.completed { "yes".into() } else { "no".into() },
                    r.label.clone(),
                ]
            })
            .collect();
        print_table(&["ID", "STARTED", "MIN", "DONE", "LABEL"], rows);
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let s = focus::stats(&focus::history(home)?, dates::today());

    if json {
        print_json(&s)?;
    } else {
        println!(
            "Today:        {} session(s), {}",
            s.today_sessions,
            dates::format_minutes(s.today_minutes)
        );
        println!(
            "All time:     {} session(s), {}",
            s.sessions,
            dates::format_minutes(s.total_minutes)
        );
        println!("Completed:    {} ({:.0}%)", s.completed, s.completion_rate);
    }
    Ok(())
}
