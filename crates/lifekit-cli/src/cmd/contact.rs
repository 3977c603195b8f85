use crate::output::{or_dash, print_json, print_table, write_export};
use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};
use lifekit_core::{
    contact::{self, AddressBook, Contact, ContactFields},
    dates, store,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ContactSubcommand {
    /// Add a contact
    Add {
        name: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// All contacts, alphabetical
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show one contact by id or name
    Show { contact: String },
    /// Search every contact field
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Update contact fields
    Edit {
        contact: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a contact
    Remove { contact: String },
    /// Birthdays in the next N days
    Birthdays {
        #[arg(long, default_value = "30")]
        days: i64,
    },
    /// Export the address book
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import a JSON export
    Import { file: PathBuf },
}

#[derive(Args)]
pub struct FieldArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    company: Option<String>,
    /// MM-DD or YYYY-MM-DD
    #[arg(long)]
    birthday: Option<String>,
    #[arg(long = "tag", short = 't')]
    tags: Vec<String>,
    #[arg(long)]
    notes: Option<String>,
}

impl FieldArgs {
    fn into_fields(self, name: Option<String>) -> ContactFields {
        ContactFields {
            name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            birthday: self.birthday,
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags)
            },
            notes: self.notes,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

pub fn run(home: &Path, subcmd: ContactSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContactSubcommand::Add { name, fields } => add(home, fields.into_fields(Some(name)), json),
        ContactSubcommand::List { tag } => list(home, tag.as_deref(), json),
        ContactSubcommand::Show { contact } => show(home, &contact, json),
        ContactSubcommand::Search { query } => search(home, &query.join(" "), json),
        ContactSubcommand::Edit {
            contact,
            name,
            fields,
        } => edit(home, &contact, fields.into_fields(name), json),
        ContactSubcommand::Remove { contact } => remove(home, &contact, json),
        ContactSubcommand::Birthdays { days } => birthdays(home, days, json),
        ContactSubcommand::Export { format, output } => export(home, format, output.as_deref()),
        ContactSubcommand::Import { file } => import(home, &file, json),
    }
}

fn rows(contacts: &[&Contact]) -> Vec<Vec<String>> {
    contacts
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                or_dash(c.email.as_ref()),
                or_dash(c.phone.as_ref()),
                or_dash(c.company.as_ref()),
                c.tags.join(","),
            ]
        })
        .collect()
}

fn add(home: &Path, fields: ContactFields, json: bool) -> anyhow::Result<()> {
    let c = store::update(home, |book: &mut AddressBook| book.add(fields).cloned())?;

    if json {
        print_json(&c)?;
    } else {
        println!("Added contact [{}]: {}", c.id, c.name);
    }
    Ok(())
}

fn list(home: &Path, tag: Option<&str>, json: bool) -> anyhow::Result<()> {
    let book = contact::load(home)?;
    let contacts = book.list(tag);

    if json {
        print_json(&contacts)?;
    } else if contacts.is_empty() {
        println!("No contacts.");
    } else {
        print_table(&["ID", "NAME", "EMAIL", "PHONE", "COMPANY", "TAGS"], rows(&contacts));
    }
    Ok(())
}

fn show(home: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let book = contact::load(home)?;
    let c = book.find(key)?;

    if json {
        print_json(c)?;
        return Ok(());
    }
    println!("[{}] {}", c.id, c.name);
    println!("Email:     {}", or_dash(c.email.as_ref()));
    println!("Phone:     {}", or_dash(c.phone.as_ref()));
    println!("Company:   {}", or_dash(c.company.as_ref()));
    println!("Birthday:  {}", or_dash(c.birthday.as_ref()));
    if !c.tags.is_empty() {
        println!("Tags:      {}", c.tags.join(", "));
    }
    if let Some(notes) = &c.notes {
        println!();
        println!("{notes}");
    }
    Ok(())
}

fn search(home: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let book = contact::load(home)?;
    let found = book.search(query);

    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        println!("No contacts match '{query}'.");
    } else {
        print_table(&["ID", "NAME", "EMAIL", "PHONE", "COMPANY", "TAGS"], rows(&found));
    }
    Ok(())
}

fn edit(home: &Path, key: &str, fields: ContactFields, json: bool) -> anyhow::Result<()> {
    let c = store::update(home, |book: &mut AddressBook| {
        let id = book.find(key)?.id;
        book.edit(id, fields).cloned()
    })?;

    if json {
        print_json(&c)?;
    } else {
        println!("Updated contact [{}]: {}", c.id, c.name);
    }
    Ok(())
}

fn remove(home: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let removed = store::update(home, |book: &mut AddressBook| {
        let id = book.find(key)?.id;
        book.remove(id)
    })?;

    if json {
        print_json(&removed)?;
    } else {
        println!("Removed contact [{}]: {}", removed.id, removed.name);
    }
    Ok(())
}

fn birthdays(home: &Path, days: i64, json: bool) -> anyhow::Result<()> {
    let book = contact::load(home)?;
    let upcoming = book.upcoming_birthdays(dates::today(), days);

    if json {
        print_json(&upcoming)?;
    } else if upcoming.is_empty() {
        println!("No birthdays in the next {days} days.");
    } else {
        let rows = upcoming
            .iter()
            .map(|b| {
                let when = match b.in_days {
                    0 => "today".to_string(),
                    1 => "tomorrow".to_string(),
                    n => format!("in {n} days"),
                };
                vec![
                    b.date.format("%b %-d").to_string(),
                    b.name.clone(),
                    when,
                    or_dash(b.turning),
                ]
            })
            .collect();
        print_table(&["DATE", "NAME", "WHEN", "TURNING"], rows);
    }
    Ok(())
}

fn export(home: &Path, format: ExportFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let book = contact::load(home)?;
    let content = match format {
        ExportFormat::Json => {
            let mut s = contact::to_json(&book.export())?;
            s.push('\n');
            s
        }
        ExportFormat::Csv => contact::to_csv(&book.contacts)?,
    };
    write_export(output, &content)
}

fn import(home: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let export = contact::from_json(&data)
        .with_context(|| format!("{} is not a contacts export", file.display()))?;
    let report = store::update(home, |book: &mut AddressBook| Ok(book.import(export)))?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Imported {} contact(s), {} with new ids",
            report.imported, report.reassigned
        );
    }
    Ok(())
}
