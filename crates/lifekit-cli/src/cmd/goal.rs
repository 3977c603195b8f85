use crate::cmd::local_time;
use crate::output::{or_dash, print_json, print_table};
use clap::Subcommand;
use lifekit_core::{
    dates,
    goal::{self, GoalBook},
    store, text,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum GoalSubcommand {
    /// Set a new goal
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        due: Option<String>,
    },
    /// Active goals (or all with --all)
    List {
        #[arg(long)]
        all: bool,
    },
    /// Goal details with milestones
    Show { id: u64 },
    /// Set progress by hand (0-100)
    Progress { id: u64, percent: String },
    /// Manage milestones within a goal
    Milestone {
        #[command(subcommand)]
        subcommand: MilestoneSubcommand,
    },
    /// Mark a goal completed
    Complete { id: u64 },
    /// Archive a goal
    Archive { id: u64 },
    /// Delete a goal
    Remove { id: u64 },
    /// Goal statistics
    Stats,
}

#[derive(Subcommand)]
pub enum MilestoneSubcommand {
    /// Add a milestone
    Add {
        goal: u64,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Mark a milestone done
    Done { goal: u64, milestone: u64 },
    /// Delete a milestone
    Remove { goal: u64, milestone: u64 },
}

pub fn run(home: &Path, subcmd: GoalSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        GoalSubcommand::Add {
            title,
            category,
            due,
        } => add(home, &title, category, due.as_deref(), json),
        GoalSubcommand::List { all } => list(home, all, json),
        GoalSubcommand::Show { id } => show(home, id, json),
        GoalSubcommand::Progress { id, percent } => progress(home, id, &percent, json),
        GoalSubcommand::Milestone { subcommand } => run_milestone(home, subcommand, json),
        GoalSubcommand::Complete { id } => complete(home, id, json),
        GoalSubcommand::Archive { id } => archive(home, id, json),
        GoalSubcommand::Remove { id } => remove(home, id, json),
        GoalSubcommand::Stats => stats(home, json),
    }
}

fn add(
    home: &Path,
    words: &[String],
    category: Option<String>,
    due: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let title = text::join_words(words)
        .ok_or_else(|| anyhow::anyhow!("goal title cannot be empty"))?;
    let due = crate::cmd::opt_date(due)?;
    let g = store::update(home, |book: &mut GoalBook| {
        book.add(&title, category, due).cloned()
    })?;

    if json {
        print_json(&g)?;
    } else {
        println!("Added goal [{}]: {}", g.id, g.title);
    }
    Ok(())
}

fn list(home: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let book = goal::load(home)?;
    let goals = book.list(all);

    if json {
        print_json(&goals)?;
        return Ok(());
    }
    if goals.is_empty() {
        println!("No goals.");
        return Ok(());
    }
    let today = dates::today();
    let rows = goals
        .iter()
        .map(|g| {
            let due = match g.due {
                Some(d) if g.is_overdue(today) => format!("{d} !"),
                other => or_dash(other),
            };
            let milestones = if g.milestones.is_empty() {
                String::new()
            } else {
                let done = g.milestones.iter().filter(|m| m.done).count();
                format!("{done}/{}", g.milestones.len())
            };
            vec![
                g.id.to_string(),
                text::truncate(&g.title, 40),
                or_dash(g.category.as_ref()),
                format!("{} {:>3}%", goal::progress_bar(g.progress, 10), g.progress),
                milestones,
                due,
                g.status.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "GOAL", "CATEGORY", "PROGRESS", "MILESTONES", "DUE", "STATUS"],
        rows,
    );
    Ok(())
}

fn show(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let book = goal::load(home)?;
    let g = book.get(id)?;

    if json {
        print_json(g)?;
        return Ok(());
    }
    println!("[{}] {}", g.id, g.title);
    println!("Status:    {}", g.status);
    println!("Category:  {}", or_dash(g.category.as_ref()));
    println!("Due:       {}", or_dash(g.due));
    println!("Progress:  {} {}%", goal::progress_bar(g.progress, 20), g.progress);
    println!("Created:   {}", local_time(g.created_at));
    if let Some(at) = g.completed_at {
        println!("Completed: {}", local_time(at));
    }
    if !g.milestones.is_empty() {
        println!();
        println!("Milestones:");
        for m in &g.milestones {
            let mark = if m.done { "x" } else { " " };
            println!("  [{mark}] {}. {}", m.id, m.title);
        }
    }
    Ok(())
}

fn progress(home: &Path, id: u64, percent: &str, json: bool) -> anyhow::Result<()> {
    let pct = lifekit_core::dates::parse_percentage(percent)?;
    let g = store::update(home, |book: &mut GoalBook| book.set_progress(id, pct).cloned())?;

    if json {
        print_json(&g)?;
    } else {
        println!("Goal [{id}] progress: {} {}%", goal::progress_bar(g.progress, 20), g.progress);
    }
    Ok(())
}

fn run_milestone(home: &Path, subcmd: MilestoneSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MilestoneSubcommand::Add { goal, title } => {
            let title = text::join_words(&title)
                .ok_or_else(|| anyhow::anyhow!("milestone title cannot be empty"))?;
            let mid = store::update(home, |book: &mut GoalBook| book.add_milestone(goal, &title))?;
            if json {
                print_json(&serde_json::json!({ "goal": goal, "milestone": mid, "title": title }))?;
            } else {
                println!("Added milestone [{goal}.{mid}]: {title}");
            }
        }
        MilestoneSubcommand::Done { goal, milestone } => {
            let progress = store::update(home, |book: &mut GoalBook| {
                book.complete_milestone(goal, milestone)
            })?;
            if json {
                print_json(&serde_json::json!({
                    "goal": goal,
                    "milestone": milestone,
                    "progress": progress,
                }))?;
            } else {
                println!("Milestone [{goal}.{milestone}] done. Goal progress: {progress}%");
            }
        }
        MilestoneSubcommand::Remove { goal, milestone } => {
            let removed = store::update(home, |book: &mut GoalBook| {
                book.remove_milestone(goal, milestone)
            })?;
            if json {
                print_json(&removed)?;
            } else {
                println!("Removed milestone [{goal}.{milestone}]: {}", removed.title);
            }
        }
    }
    Ok(())
}

fn complete(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let g = store::update(home, |book: &mut GoalBook| book.complete(id).cloned())?;

    if json {
        print_json(&g)?;
    } else {
        println!("Completed goal [{id}]: {}", g.title);
    }
    Ok(())
}

fn archive(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let g = store::update(home, |book: &mut GoalBook| book.archive(id).cloned())?;

    if json {
        print_json(&g)?;
    } else {
        println!("Archived goal [{id}]: {}", g.title);
    }
    Ok(())
}

fn remove(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |book: &mut GoalBook| book.remove(id))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed goal [{id}]: {}", removed.title);
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let s = goal::load(home)?.stats(dates::today());

    if json {
        print_json(&s)?;
    } else {
        println!("Total:             {}", s.total);
        println!("Active:            {}", s.active);
        println!("Completed:         {}", s.completed);
        println!("Archived:          {}", s.archived);
        println!("Overdue:           {}", s.overdue);
        println!("Average progress:  {}%", s.average_progress);
        println!("Milestones:        {}/{}", s.milestones_done, s.milestones_total);
    }
    Ok(())
}
