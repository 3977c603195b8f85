use crate::cmd::local_time;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use lifekit_core::{
    inbox::{self, Destination, Inbox, InboxItem},
    store,
    task::Priority,
    text,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum InboxSubcommand {
    /// Capture a thought
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List pending items
    List {
        /// Include processed items
        #[arg(long)]
        all: bool,
    },
    /// Move an item to tasks or notes, or trash it
    Process {
        id: u64,
        /// task, note or trash
        #[arg(long)]
        to: Destination,
        /// Priority for the created task
        #[arg(long, short)]
        priority: Option<Priority>,
    },
    /// Drop processed items
    Clear,
    /// Show inbox statistics
    Stats,
}

pub fn run(home: &Path, subcmd: InboxSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        InboxSubcommand::Add { text } => add(home, &text, json),
        InboxSubcommand::List { all } => list(home, all, json),
        InboxSubcommand::Process { id, to, priority } => process(home, id, to, priority, json),
        InboxSubcommand::Clear => clear(home, json),
        InboxSubcommand::Stats => stats(home, json),
    }
}

fn add(home: &Path, words: &[String], json: bool) -> anyhow::Result<()> {
    let text = text::join_words(words)
        .ok_or_else(|| anyhow::anyhow!("inbox item cannot be empty"))?;
    let item = store::update(home, |inbox: &mut Inbox| inbox.add(&text).cloned())?;

    if json {
        print_json(&item)?;
    } else {
        println!("Captured [{}]: {}", item.id, item.text);
    }
    Ok(())
}

fn list(home: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let inbox = inbox::load(home)?;
    let items: Vec<&InboxItem> = if all {
        inbox.items.iter().collect()
    } else {
        inbox.pending()
    };

    if json {
        print_json(&items)?;
        return Ok(());
    }
    if items.is_empty() {
        println!("Inbox zero.");
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|i| {
            let status = match &i.outcome {
                Some(o) => match o.target_id {
                    Some(t) => format!("-> {} {t}", o.destination),
                    None => format!("-> {}", o.destination),
                },
                None => "pending".to_string(),
            };
            vec![
                i.id.to_string(),
                local_time(i.created_at),
                status,
                text::truncate(&i.text, 60),
            ]
        })
        .collect();
    print_table(&["ID", "CAPTURED", "STATUS", "TEXT"], rows);
    Ok(())
}

fn process(
    home: &Path,
    id: u64,
    to: Destination,
    priority: Option<Priority>,
    json: bool,
) -> anyhow::Result<()> {
    let item = inbox::process(home, id, to, priority)?;

    if json {
        print_json(&item)?;
        return Ok(());
    }
    match item.outcome.as_ref().and_then(|o| o.target_id) {
        Some(target) => println!("Moved inbox item [{id}] to {to} [{target}]"),
        None => println!("Trashed inbox item [{id}]"),
    }
    Ok(())
}

fn clear(home: &Path, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |inbox: &mut Inbox| Ok(inbox.clear_processed()))?;

    if json {
        print_json(&serde_json::json!({ "removed": removed }))?;
    } else {
        println!("Removed {removed} processed item(s)");
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let s = inbox::load(home)?.stats();

    if json {
        print_json(&s)?;
    } else {
        println!("Captured:  {}", s.total);
        println!("Pending:   {}", s.pending);
        println!("To tasks:  {}", s.to_tasks);
        println!("To notes:  {}", s.to_notes);
        println!("Trashed:   {}", s.trashed);
    }
    Ok(())
}
