use crate::output::{print_json, print_table};
use clap::Subcommand;
use lifekit_core::{
    checklist::{self, Checklist, Checklists},
    store, text,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum ChecklistSubcommand {
    /// Create a checklist, optionally with items
    New { name: String, items: Vec<String> },
    /// Append an item
    Add {
        name: String,
        #[arg(required = true)]
        item: Vec<String>,
    },
    /// Tick item N (1-based)
    Check { name: String, item: usize },
    /// Untick item N
    Uncheck { name: String, item: usize },
    /// Remove item N
    RemoveItem { name: String, item: usize },
    /// Show a checklist
    Show { name: String },
    /// All checklists with progress
    List,
    /// Untick every item
    Reset { name: String },
    /// Copy a checklist under a new name
    Copy { src: String, dst: String },
    /// Delete a checklist
    Delete { name: String },
}

pub fn run(home: &Path, subcmd: ChecklistSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ChecklistSubcommand::New { name, items } => new(home, &name, &items, json),
        ChecklistSubcommand::Add { name, item } => add(home, &name, &item, json),
        ChecklistSubcommand::Check { name, item } => set_done(home, &name, item, true, json),
        ChecklistSubcommand::Uncheck { name, item } => set_done(home, &name, item, false, json),
        ChecklistSubcommand::RemoveItem { name, item } => remove_item(home, &name, item, json),
        ChecklistSubcommand::Show { name } => show(home, &name, json),
        ChecklistSubcommand::List => list(home, json),
        ChecklistSubcommand::Reset { name } => reset(home, &name, json),
        ChecklistSubcommand::Copy { src, dst } => copy(home, &src, &dst, json),
        ChecklistSubcommand::Delete { name } => delete(home, &name, json),
    }
}

fn print_list(list: &Checklist) {
    println!("{} ({}/{})", list.name, list.done_count(), list.items.len());
    if list.items.is_empty() {
        println!("  (no items)");
    }
    for (i, item) in list.items.iter().enumerate() {
        let mark = if item.done { "x" } else { " " };
        println!("  {:>2}. [{mark}] {}", i + 1, item.text);
    }
    if list.is_complete() {
        println!("All done.");
    }
}

fn new(home: &Path, name: &str, items: &[String], json: bool) -> anyhow::Result<()> {
    let list = store::update(home, |lists: &mut Checklists| lists.create(name, items).cloned())?;

    if json {
        print_json(&list)?;
    } else {
        println!(
            "Created checklist [{}]: {} ({} items)",
            list.id,
            list.name,
            list.items.len()
        );
    }
    Ok(())
}

fn add(home: &Path, name: &str, words: &[String], json: bool) -> anyhow::Result<()> {
    let item = text::join_words(words).ok_or_else(|| anyhow::anyhow!("item text cannot be empty"))?;
    let position = store::update(home, |lists: &mut Checklists| lists.add_item(name, &item))?;

    if json {
        print_json(&serde_json::json!({ "checklist": name, "position": position, "text": item }))?;
    } else {
        println!("Added item {position} to '{name}': {item}");
    }
    Ok(())
}

fn set_done(
    home: &Path,
    name: &str,
    position: usize,
    done: bool,
    json: bool,
) -> anyhow::Result<()> {
    let list = store::update(home, |lists: &mut Checklists| {
        lists.set_done(name, position, done).cloned()
    })?;

    if json {
        print_json(&list)?;
    } else {
        print_list(&list);
    }
    Ok(())
}

fn remove_item(home: &Path, name: &str, position: usize, json: bool) -> anyhow::Result<()> {
    let item = store::update(home, |lists: &mut Checklists| lists.remove_item(name, position))?;

    if json {
        print_json(&item)?;
    } else {
        println!("Removed item {position} from '{name}': {}", item.text);
    }
    Ok(())
}

fn show(home: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let lists = checklist::load(home)?;
    let list = lists.get(name)?;

    if json {
        print_json(list)?;
    } else {
        print_list(list);
    }
    Ok(())
}

fn list(home: &Path, json: bool) -> anyhow::Result<()> {
    let lists = checklist::load(home)?;

    if json {
        print_json(&lists.lists)?;
    } else if lists.lists.is_empty() {
        println!("No checklists.");
    } else {
        let rows = lists
            .lists
            .iter()
            .map(|l| {
                vec![
                    l.id.to_string(),
                    l.name.clone(),
                    format!("{}/{}", l.done_count(), l.items.len()),
                    if l.is_complete() { "done".into() } else { String::new() },
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "ITEMS", ""], rows);
    }
    Ok(())
}

fn reset(home: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cleared = store::update(home, |lists: &mut Checklists| lists.reset(name))?;

    if json {
        print_json(&serde_json::json!({ "checklist": name, "unchecked": cleared }))?;
    } else {
        println!("Reset '{name}': unchecked {cleared} item(s)");
    }
    Ok(())
}

fn copy(home: &Path, src: &str, dst: &str, json: bool) -> anyhow::Result<()> {
    let list = store::update(home, |lists: &mut Checklists| lists.copy(src, dst).cloned())?;

    if json {
        print_json(&list)?;
    } else {
        println!("Copied '{src}' to [{}]: {}", list.id, list.name);
    }
    Ok(())
}

fn delete(home: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |lists: &mut Checklists| lists.delete(name))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Deleted checklist [{}]: {}", removed.id, removed.name);
    }
    Ok(())
}
