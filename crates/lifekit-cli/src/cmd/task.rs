use crate::cmd::local_time;
use crate::output::{or_dash, print_json, print_table};
use clap::Subcommand;
use lifekit_core::{
    dates, store,
    task::{self, NewTask, Priority, Task, TaskEdit, TaskFilter, TaskList},
    text,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Add a task
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        /// high, medium or low
        #[arg(long, short)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD, today, tomorrow, +3d)
        #[arg(long, short)]
        due: Option<String>,
        /// Tag (repeatable or comma-separated)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// List tasks (open by default)
    List {
        /// Include completed tasks
        #[arg(long, conflicts_with = "done")]
        all: bool,
        /// Only completed tasks
        #[arg(long)]
        done: bool,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, short)]
        priority: Option<Priority>,
    },
    /// Mark a task as done
    Done { id: u64 },
    /// Re-open a completed task
    Undo { id: u64 },
    /// Edit task fields
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        priority: Option<Priority>,
        #[arg(long, short)]
        due: Option<String>,
        /// Replace tags
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// Delete a task
    Remove { id: u64 },
    /// Search task titles and tags
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Delete all completed tasks
    ClearDone,
    /// Show task statistics
    Stats,
    /// Show one task
    Show { id: u64 },
}

pub fn run(home: &Path, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TaskSubcommand::Add {
            title,
            priority,
            due,
            tags,
        } => add(home, &title, priority, due.as_deref(), &tags, json),
        TaskSubcommand::List {
            all,
            done,
            tag,
            priority,
        } => {
            let filter = if all {
                TaskFilter::All
            } else if done {
                TaskFilter::Done
            } else {
                TaskFilter::Open
            };
            list(home, filter, tag.as_deref(), priority, json)
        }
        TaskSubcommand::Done { id } => complete(home, id, json),
        TaskSubcommand::Undo { id } => reopen(home, id, json),
        TaskSubcommand::Edit {
            id,
            title,
            priority,
            due,
            tags,
        } => edit(home, id, title, priority, due.as_deref(), tags, json),
        TaskSubcommand::Remove { id } => remove(home, id, json),
        TaskSubcommand::Search { query } => search(home, &query.join(" "), json),
        TaskSubcommand::ClearDone => clear_done(home, json),
        TaskSubcommand::Stats => stats(home, json),
        TaskSubcommand::Show { id } => show(home, id, json),
    }
}

fn add(
    home: &Path,
    title: &[String],
    priority: Option<Priority>,
    due: Option<&str>,
    tags: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let title =
        text::join_words(title).ok_or_else(|| anyhow::anyhow!("task title cannot be empty"))?;
    let due = crate::cmd::opt_date(due)?;
    let task = task::add(
        home,
        NewTask {
            title,
            priority: priority.unwrap_or_default(),
            due,
            tags: tags.to_vec(),
        },
    )?;

    if json {
        print_json(&task)?;
    } else {
        println!("Added task [{}]: {}", task.id, task.title);
    }
    Ok(())
}

fn task_rows(tasks: &[&Task]) -> Vec<Vec<String>> {
    let today = dates::today();
    tasks
        .iter()
        .map(|t| {
            let due = match t.due {
                Some(d) if t.is_overdue(today) => format!("{d} !"),
                other => or_dash(other),
            };
            vec![
                t.id.to_string(),
                if t.done { "x".into() } else { " ".into() },
                t.priority.to_string(),
                due,
                text::truncate(&t.title, 50),
                t.tags.join(","),
            ]
        })
        .collect()
}

fn list(
    home: &Path,
    filter: TaskFilter,
    tag: Option<&str>,
    priority: Option<Priority>,
    json: bool,
) -> anyhow::Result<()> {
    let tasks = task::load(home)?;
    let shown = tasks.filtered(filter, tag, priority);

    if json {
        print_json(&shown)?;
        return Ok(());
    }
    if shown.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    print_table(&["ID", "", "PRIORITY", "DUE", "TITLE", "TAGS"], task_rows(&shown));
    Ok(())
}

fn complete(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let (changed, title) = store::update(home, |list: &mut TaskList| {
        let changed = list.complete(id)?;
        Ok((changed, list.get(id)?.title.clone()))
    })?;

    if json {
        print_json(&serde_json::json!({ "id": id, "done": true, "changed": changed }))?;
    } else if changed {
        println!("Completed task [{id}]: {title}");
    } else {
        println!("Task [{id}] was already done");
    }
    Ok(())
}

fn reopen(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let changed = store::update(home, |list: &mut TaskList| list.reopen(id))?;

    if json {
        print_json(&serde_json::json!({ "id": id, "done": false, "changed": changed }))?;
    } else if changed {
        println!("Re-opened task [{id}]");
    } else {
        println!("Task [{id}] is already open");
    }
    Ok(())
}

fn edit(
    home: &Path,
    id: u64,
    title: Option<String>,
    priority: Option<Priority>,
    due: Option<&str>,
    tags: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let edit = TaskEdit {
        title,
        priority,
        due: crate::cmd::opt_date(due)?,
        tags: if tags.is_empty() { None } else { Some(tags) },
    };
    let task = store::update(home, |list: &mut TaskList| list.edit(id, edit).cloned())?;

    if json {
        print_json(&task)?;
    } else {
        println!("Updated task [{id}]: {}", task.title);
    }
    Ok(())
}

fn remove(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |list: &mut TaskList| list.remove(id))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed task [{id}]: {}", removed.title);
    }
    Ok(())
}

fn search(home: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let tasks = task::load(home)?;
    let found = tasks.search(query);

    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        println!("No tasks match '{query}'.");
    } else {
        print_table(&["ID", "", "PRIORITY", "DUE", "TITLE", "TAGS"], task_rows(&found));
    }
    Ok(())
}

fn clear_done(home: &Path, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |list: &mut TaskList| Ok(list.clear_done()))?;

    if json {
        print_json(&serde_json::json!({ "removed": removed }))?;
    } else {
        println!("Removed {removed} completed task(s)");
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let s = task::load(home)?.stats(dates::today());

    if json {
        print_json(&s)?;
    } else {
        println!("Total:       {}", s.total);
        println!("Open:        {}", s.open);
        println!("Done:        {}", s.done);
        println!("Overdue:     {}", s.overdue);
        println!("High prio:   {}", s.high);
        println!("Completion:  {}%", s.completion_rate);
    }
    Ok(())
}

fn show(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let tasks = task::load(home)?;
    let t = tasks.get(id)?;

    if json {
        print_json(t)?;
        return Ok(());
    }
    println!("[{}] {}", t.id, t.title);
    println!("Priority:  {}", t.priority);
    println!("Due:       {}", or_dash(t.due));
    println!("Tags:      {}", if t.tags.is_empty() { "-".into() } else { t.tags.join(", ") });
    println!("Status:    {}", if t.done { "done" } else { "open" });
    println!("Created:   {}", local_time(t.created_at));
    if let Some(at) = t.completed_at {
        println!("Completed: {}", local_time(at));
    }
    Ok(())
}
