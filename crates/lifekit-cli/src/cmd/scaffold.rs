use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use lifekit_core::{
    dates,
    scaffold::{self, Origin},
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ScaffoldSubcommand {
    /// Available templates
    List,
    /// Create a project from a template
    New {
        template: String,
        /// Project name (lowercase slug)
        name: String,
        /// Parent directory (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Files a template would create
    Show { template: String },
}

pub fn run(home: &Path, subcmd: ScaffoldSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ScaffoldSubcommand::List => list(home, json),
        ScaffoldSubcommand::New {
            template,
            name,
            dir,
        } => new(home, &template, &name, dir, json),
        ScaffoldSubcommand::Show { template } => show(home, &template, json),
    }
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Builtin => "built-in",
        Origin::User => "user",
    }
}

fn list(home: &Path, json: bool) -> anyhow::Result<()> {
    let templates = scaffold::list(home)?;

    if json {
        print_json(&templates)?;
    } else {
        let rows = templates
            .iter()
            .map(|t| {
                vec![
                    t.name.clone(),
                    origin_label(t.origin).to_string(),
                    t.files.len().to_string(),
                    t.description.clone(),
                ]
            })
            .collect();
        print_table(&["TEMPLATE", "ORIGIN", "FILES", "DESCRIPTION"], rows);
    }
    Ok(())
}

fn new(
    home: &Path,
    template: &str,
    name: &str,
    dir: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let dir = match dir {
        Some(d) => d,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let created = scaffold::create(home, template, name, &dir, dates::today())?;

    if json {
        print_json(&created)?;
    } else {
        println!("Created {} from '{template}':", created.root.display());
        for f in &created.files {
            let rel = f.strip_prefix(&created.root).unwrap_or(f);
            println!("  {}", rel.display());
        }
    }
    Ok(())
}

fn show(home: &Path, template: &str, json: bool) -> anyhow::Result<()> {
    let t = scaffold::find(home, template)?;

    if json {
        print_json(&t)?;
        return Ok(());
    }
    println!("{} ({}): {}", t.name, origin_label(t.origin), t.description);
    for f in &t.files {
        println!("  {}", f.path);
    }
    Ok(())
}
