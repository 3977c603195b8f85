use crate::cmd::local_time;
use crate::output::{print_json, print_table, write_export};
use clap::Subcommand;
use lifekit_core::{
    note::{self, Note, NoteBook},
    store, text,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum NoteSubcommand {
    /// Jot a note
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// Recent notes, newest first
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },
    /// Show one note
    Show { id: u64 },
    /// Search note text and tags
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Delete a note
    Remove { id: u64 },
    /// Delete every note
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
    /// Tags with note counts
    Tags,
    /// Export notes as markdown
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(home: &Path, subcmd: NoteSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NoteSubcommand::Add { text, tags } => add(home, &text, &tags, json),
        NoteSubcommand::List { tag, limit } => list(home, tag.as_deref(), limit, json),
        NoteSubcommand::Show { id } => show(home, id, json),
        NoteSubcommand::Search { query } => search(home, &query.join(" "), json),
        NoteSubcommand::Remove { id } => remove(home, id, json),
        NoteSubcommand::Clear { yes } => clear(home, yes, json),
        NoteSubcommand::Tags => tags(home, json),
        NoteSubcommand::Export { output } => export(home, output.as_deref()),
    }
}

fn rows(notes: &[&Note]) -> Vec<Vec<String>> {
    notes
        .iter()
        .map(|n| {
            vec![
                n.id.to_string(),
                local_time(n.created_at),
                text::truncate(&n.text, 60),
                n.tags.join(","),
            ]
        })
        .collect()
}

fn add(home: &Path, words: &[String], tags: &[String], json: bool) -> anyhow::Result<()> {
    let body = text::join_words(words).ok_or_else(|| anyhow::anyhow!("note cannot be empty"))?;
    let note = note::add(home, &body, tags)?;

    if json {
        print_json(&note)?;
    } else {
        println!("Saved note [{}]", note.id);
    }
    Ok(())
}

fn list(home: &Path, tag: Option<&str>, limit: usize, json: bool) -> anyhow::Result<()> {
    let book = note::load(home)?;
    let notes = book.recent(tag, Some(limit));

    if json {
        print_json(&notes)?;
    } else if notes.is_empty() {
        println!("No notes.");
    } else {
        print_table(&["ID", "CREATED", "NOTE", "TAGS"], rows(&notes));
    }
    Ok(())
}

fn show(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let book = note::load(home)?;
    let n = book.get(id)?;

    if json {
        print_json(n)?;
        return Ok(());
    }
    println!("[{}] {}", n.id, local_time(n.created_at));
    if !n.tags.is_empty() {
        println!("Tags: {}", n.tags.join(", "));
    }
    println!();
    println!("{}", n.text);
    Ok(())
}

fn search(home: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let book = note::load(home)?;
    let found = book.search(query);

    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        println!("No notes match '{query}'.");
    } else {
        print_table(&["ID", "CREATED", "NOTE", "TAGS"], rows(&found));
    }
    Ok(())
}

fn remove(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |book: &mut NoteBook| book.remove(id))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed note [{id}]");
    }
    Ok(())
}

fn clear(home: &Path, yes: bool, json: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to delete all notes without --yes");
    }
    let removed = store::update(home, |book: &mut NoteBook| Ok(book.clear()))?;

    if json {
        print_json(&serde_json::json!({ "removed": removed }))?;
    } else {
        println!("Removed {removed} note(s)");
    }
    Ok(())
}

fn tags(home: &Path, json: bool) -> anyhow::Result<()> {
    let counts = note::load(home)?.tag_counts();

    if json {
        print_json(&counts)?;
    } else if counts.is_empty() {
        println!("No tags.");
    } else {
        let rows = counts
            .into_iter()
            .map(|(tag, n)| vec![format!("#{tag}"), n.to_string()])
            .collect();
        print_table(&["TAG", "NOTES"], rows);
    }
    Ok(())
}

fn export(home: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let book = note::load(home)?;
    write_export(output, &note::to_markdown(&book.notes))
}
