use crate::cmd::local_time;
use crate::output::{or_dash, print_json, print_table};
use chrono::Utc;
use clap::Subcommand;
use lifekit_core::{
    backup::{self, human_size, BackupBook},
    config::Config,
    store,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum BackupSubcommand {
    /// Register a file or directory to back up
    AddSource {
        path: PathBuf,
        /// Top-level name inside the archive (default: the path's file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Registered sources
    Sources,
    /// Unregister a source
    RemoveSource { id: u64 },
    /// Archive all sources now
    Run {
        /// Destination directory (default from config)
        #[arg(long)]
        dest: Option<PathBuf>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Backup history
    List,
    /// Recompute an archive's checksum
    Verify { id: u64 },
    /// Extract an archive
    Restore {
        id: u64,
        /// Target directory (default <home>/restores/<id>)
        #[arg(long)]
        to: Option<PathBuf>,
    },
    /// Delete the oldest archives
    Prune {
        /// Archives to keep (default from config)
        #[arg(long)]
        keep: Option<usize>,
    },
    /// Backup totals
    Stats,
}

pub fn run(home: &Path, subcmd: BackupSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        BackupSubcommand::AddSource { path, name } => {
            add_source(home, &path, name.as_deref(), json)
        }
        BackupSubcommand::Sources => sources(home, json),
        BackupSubcommand::RemoveSource { id } => remove_source(home, id, json),
        BackupSubcommand::Run { dest, note } => run_backup(home, dest, note.as_deref(), json),
        BackupSubcommand::List => list(home, json),
        BackupSubcommand::Verify { id } => verify(home, id, json),
        BackupSubcommand::Restore { id, to } => restore(home, id, to.as_deref(), json),
        BackupSubcommand::Prune { keep } => prune(home, keep, json),
        BackupSubcommand::Stats => stats(home, json),
    }
}

fn add_source(home: &Path, path: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let source = store::update(home, |book: &mut BackupBook| {
        book.add_source(path, name).cloned()
    })?;

    if json {
        print_json(&source)?;
    } else {
        println!(
            "Added source [{}] {}: {}",
            source.id,
            source.name,
            source.path.display()
        );
    }
    Ok(())
}

fn sources(home: &Path, json: bool) -> anyhow::Result<()> {
    let book = backup::load(home)?;

    if json {
        print_json(&book.sources)?;
    } else if book.sources.is_empty() {
        println!("No backup sources. Add one with `lk backup add-source <path>`.");
    } else {
        let rows = book
            .sources
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.name.clone(),
                    s.path.display().to_string(),
                    if s.path.exists() { String::new() } else { "missing".into() },
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "PATH", ""], rows);
    }
    Ok(())
}

fn remove_source(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |book: &mut BackupBook| book.remove_source(id))?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed source [{id}]: {}", removed.path.display());
    }
    Ok(())
}

fn run_backup(
    home: &Path,
    dest: Option<PathBuf>,
    note: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let dest = match dest {
        Some(d) => d,
        None => Config::load(home)?.backup.destination_for(home),
    };
    let record = backup::run(home, &dest, note, Utc::now())?;

    if json {
        print_json(&record)?;
    } else {
        println!(
            "Backup [{}] written: {} ({}, {} files)",
            record.id,
            record.file.display(),
            human_size(record.size),
            record.files
        );
        println!("SHA-256: {}", record.sha256);
    }
    Ok(())
}

fn list(home: &Path, json: bool) -> anyhow::Result<()> {
    let book = backup::load(home)?;

    if json {
        print_json(&book.backups)?;
    } else if book.backups.is_empty() {
        println!("No backups yet.");
    } else {
        let rows = book
            .backups
            .iter()
            .rev()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    local_time(b.created_at),
                    human_size(b.size),
                    b.files.to_string(),
                    b.sources.join(","),
                    or_dash(b.note.as_ref()),
                ]
            })
            .collect();
        print_table(&["ID", "CREATED", "SIZE", "FILES", "SOURCES", "NOTE"], rows);
    }
    Ok(())
}

fn verify(home: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let record = backup::verify(home, id)?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "file": record.file,
            "sha256": record.sha256,
            "ok": true,
        }))?;
    } else {
        println!("Backup [{id}] OK: {}", record.file.display());
    }
    Ok(())
}

fn restore(home: &Path, id: u64, to: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let target = backup::restore(home, id, to)?;

    if json {
        print_json(&serde_json::json!({ "id": id, "restored_to": target }))?;
    } else {
        println!("Restored backup [{id}] to {}", target.display());
    }
    Ok(())
}

fn prune(home: &Path, keep: Option<usize>, json: bool) -> anyhow::Result<()> {
    let keep = match keep {
        Some(k) => k,
        None => Config::load(home)?.backup.keep,
    };
    let removed = backup::prune(home, keep)?;

    if json {
        print_json(&removed)?;
    } else if removed.is_empty() {
        println!("Nothing to prune (keeping {keep}).");
    } else {
        for r in &removed {
            println!("Deleted backup [{}]: {}", r.id, r.file.display());
        }
        println!("Pruned {} backup(s), keeping {keep}.", removed.len());
    }
    Ok(())
}

fn stats(home: &Path, json: bool) -> anyhow::Result<()> {
    let s = backup::load(home)?.stats();

    if json {
        print_json(&s)?;
    } else {
        println!("Sources:      {}", s.sources);
        println!("Backups:      {}", s.backups);
        println!("Total size:   {}", human_size(s.total_size));
        println!("Last backup:  {}", or_dash(s.last_backup.map(local_time)));
    }
    Ok(())
}
