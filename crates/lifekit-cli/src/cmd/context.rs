use crate::cmd::local_time;
use crate::output::{or_dash, print_json, print_table};
use chrono::Utc;
use clap::Subcommand;
use lifekit_core::{
    context::{self, Context, ContextBook, ContextUpdate},
    dates, store,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ContextSubcommand {
    /// Create or update a context
    Save {
        name: String,
        /// Working directory for this context
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        note: Option<String>,
        /// Open task to remember (repeatable)
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
    /// Switch to a context
    Switch { name: String },
    /// Show the current context
    Current,
    /// All contexts
    List,
    /// Context details
    Show { name: String },
    /// Delete a context
    Remove { name: String },
    /// Recent switches, newest first
    History {
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },
    /// Time spent per context
    Stats,
}

pub fn run(home: &Path, subcmd: ContextSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContextSubcommand::Save {
            name,
            dir,
            note,
            tasks,
        } => save(home, &name, dir, note, tasks, json),
        ContextSubcommand::Switch { name } => switch(home, &name, json),
        ContextSubcommand::Current => current(home, json),
        ContextSubcommand::List => list(home, json),
        ContextSubcommand::Show { name } => show(home, &name, json),
        ContextSubcommand::Remove { name } => remove(home, &name, json),
        ContextSubcommand::History { limit } => history(home, limit, json),
        ContextSubcommand::Stats => stats(home, json),
    }
}

fn save(
    home: &Path,
    name: &str,
    dir: Option<PathBuf>,
    note: Option<String>,
    tasks: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    // Relative directories are stored as given only if they cannot be resolved.
    let directory = dir.map(|d| std::fs::canonicalize(&d).unwrap_or(d));
    let update = ContextUpdate {
        directory,
        notes: note,
        tasks,
    };
    let (created, ctx) = store::update(home, |book: &mut ContextBook| {
        let created = book.save(name, update)?;
        Ok((created, book.get(name)?.clone()))
    })?;

    if json {
        print_json(&ctx)?;
    } else if created {
        println!("Saved context [{}]: {}", ctx.id, ctx.name);
    } else {
        println!("Updated context [{}]: {}", ctx.id, ctx.name);
    }
    Ok(())
}

fn print_context(ctx: &Context) {
    if let Some(dir) = &ctx.directory {
        println!("Directory: {}", dir.display());
    }
    if let Some(notes) = &ctx.notes {
        println!("Notes:     {notes}");
    }
    if !ctx.tasks.is_empty() {
        println!("Tasks:");
        for t in &ctx.tasks {
            println!("  - {t}");
        }
    }
}

fn switch(home: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let (changed, ctx) = store::update(home, |book: &mut ContextBook| {
        let changed = book.switch(name, Utc::now())?;
        Ok((changed, book.get(name)?.clone()))
    })?;

    if json {
        print_json(&serde_json::json!({ "context": ctx, "switched": changed }))?;
        return Ok(());
    }
    if changed {
        println!("Switched to '{}'", ctx.name);
    } else {
        println!("Already in '{}'", ctx.name);
    }
    print_context(&ctx);
    Ok(())
}

fn current(home: &Path, json: bool) -> anyhow::Result<()> {
    let book = context::load(home)?;
    let ctx = book.current();

    if json {
        print_json(&ctx)?;
        return Ok(());
    }
    match ctx {
        Some(c) => {
            println!("{}", c.name);
            print_context(c);
        }
        None => println!("No current context."),
    }
    Ok(())
}

fn list(home: &Path, json: bool) -> anyhow::Result<()> {
    let book = context::load(home)?;

    if json {
        print_json(&book.contexts)?;
    } else if book.contexts.is_empty() {
        println!("No contexts. Save one with `lk context save <name>`.");
    } else {
        let rows = book
            .contexts
            .iter()
            .map(|c| {
                let marker = if book.current.as_deref() == Some(c.name.as_str()) {
                    "*"
                } else {
                    ""
                };
                vec![
                    marker.to_string(),
                    c.id.to_string(),
                    c.name.clone(),
                    or_dash(c.directory.as_ref().map(|d| d.display())),
                    c.tasks.len().to_string(),
                    or_dash(c.last_used.map(local_time)),
                ]
            })
            .collect();
        print_table(&["", "ID", "NAME", "DIRECTORY", "TASKS", "LAST USED"], rows);
    }
    Ok(())
}

fn show(home: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let book = context::load(home)?;
    let ctx = book.get(name)?;

    if json {
        print_json(ctx)?;
        return Ok(());
    }
    println!("[{}] {}", ctx.id, ctx.name);
    println!("Created:   {}", local_time(ctx.created_at));
    println!("Last used: {}", or_dash(ctx.last_used.map(local_time)));
    print_context(ctx);
    Ok(())
}

fn remove(home: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |book: &mut ContextBook| book.remove(name))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed context [{}]: {}", removed.id, removed.name);
    }
    Ok(())
}

fn history(home: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let book = context::load(home)?;
    let recent: Vec<_> = book.history.iter().rev().take(limit).collect();

    if json {
        print_json(&recent)?;
    } else if recent.is_empty() {
        println!("No context switches yet.");
    } else {
        let rows = recent
            .iter()
            .map(|s| vec![local_time(s.at), s.context.clone()])
            .collect();
        print_table(&["AT", "CONTEXT"], rows);
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let book = context::load(home)?;
    let times = book.time_per_context(Utc::now());

    if json {
        print_json(&times)?;
    } else if times.is_empty() {
        println!("No context switches yet.");
    } else {
        let rows = times
            .iter()
            .map(|t| {
                vec![
                    t.context.clone(),
                    dates::format_minutes(t.minutes.max(0) as u64),
                    t.switches.to_string(),
                ]
            })
            .collect();
        print_table(&["CONTEXT", "TIME", "SWITCHES"], rows);
    }
    Ok(())
}
