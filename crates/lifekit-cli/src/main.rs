mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    backup::BackupSubcommand, checklist::ChecklistSubcommand, config::ConfigSubcommand,
    contact::ContactSubcommand, context::ContextSubcommand, focus::FocusSubcommand,
    goal::GoalSubcommand, habit::HabitSubcommand, inbox::InboxSubcommand,
    journal::JournalSubcommand, note::NoteSubcommand, scaffold::ScaffoldSubcommand,
    task::TaskSubcommand, timelog::TimelogSubcommand, win::WinSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lk",
    about = "Personal productivity tools: tasks, habits, goals, notes, time and backups",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data directory (default: ~/.lifekit)
    #[arg(long, global = true, env = "LIFEKIT_HOME")]
    home: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the to-do list
    #[command(alias = "tasks")]
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Capture now, sort later
    Inbox {
        #[command(subcommand)]
        subcommand: InboxSubcommand,
    },

    /// Quick notes
    #[command(alias = "notes")]
    Note {
        #[command(subcommand)]
        subcommand: NoteSubcommand,
    },

    /// Daily journal with mood and prompts
    Journal {
        #[command(subcommand)]
        subcommand: JournalSubcommand,
    },

    /// Record wins and accomplishments
    #[command(alias = "wins")]
    Win {
        #[command(subcommand)]
        subcommand: WinSubcommand,
    },

    /// Daily and weekly habits with streaks
    #[command(alias = "habits")]
    Habit {
        #[command(subcommand)]
        subcommand: HabitSubcommand,
    },

    /// Goals, progress and milestones
    #[command(alias = "goals")]
    Goal {
        #[command(subcommand)]
        subcommand: GoalSubcommand,
    },

    /// Pomodoro-style focus sessions
    Focus {
        #[command(subcommand)]
        subcommand: FocusSubcommand,
    },

    /// Track time per project
    #[command(alias = "time")]
    Timelog {
        #[command(subcommand)]
        subcommand: TimelogSubcommand,
    },

    /// Address book with birthdays
    #[command(alias = "contacts")]
    Contact {
        #[command(subcommand)]
        subcommand: ContactSubcommand,
    },

    /// Reusable checklists
    #[command(alias = "checklists")]
    Checklist {
        #[command(subcommand)]
        subcommand: ChecklistSubcommand,
    },

    /// Save and switch work contexts
    Context {
        #[command(subcommand)]
        subcommand: ContextSubcommand,
    },

    /// Archive files and directories
    Backup {
        #[command(subcommand)]
        subcommand: BackupSubcommand,
    },

    /// Create projects from templates
    Scaffold {
        #[command(subcommand)]
        subcommand: ScaffoldSubcommand,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = root::resolve_home(cli.home.as_deref()).and_then(|home| {
        let json = cli.json;
        match cli.command {
            Commands::Task { subcommand } => cmd::task::run(&home, subcommand, json),
            Commands::Inbox { subcommand } => cmd::inbox::run(&home, subcommand, json),
            Commands::Note { subcommand } => cmd::note::run(&home, subcommand, json),
            Commands::Journal { subcommand } => cmd::journal::run(&home, subcommand, json),
            Commands::Win { subcommand } => cmd::win::run(&home, subcommand, json),
            Commands::Habit { subcommand } => cmd::habit::run(&home, subcommand, json),
            Commands::Goal { subcommand } => cmd::goal::run(&home, subcommand, json),
            Commands::Focus { subcommand } => cmd::focus::run(&home, subcommand, json),
            Commands::Timelog { subcommand } => cmd::timelog::run(&home, subcommand, json),
            Commands::Contact { subcommand } => cmd::contact::run(&home, subcommand, json),
            Commands::Checklist { subcommand } => cmd::checklist::run(&home, subcommand, json),
            Commands::Context { subcommand } => cmd::context::run(&home, subcommand, json),
            Commands::Backup { subcommand } => cmd::backup::run(&home, subcommand, json),
            Commands::Scaffold { subcommand } => cmd::scaffold::run(&home, subcommand, json),
            Commands::Config { subcommand } => cmd::config::run(&home, subcommand, json),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
