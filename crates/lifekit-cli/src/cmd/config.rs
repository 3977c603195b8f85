use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use lifekit_core::{
    config::{Config, WarnLevel},
    paths,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Print the location of config.yaml
    Path,

    /// Write a config.yaml with the defaults if none exists
    Init,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(home: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(home, json),
        ConfigSubcommand::Path => path(home, json),
        ConfigSubcommand::Init => init(home, json),
        ConfigSubcommand::Validate => validate(home, json),
    }
}

fn show(home: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(home).context("failed to load config")?;

    if json {
        print_json(&config)?;
    } else {
        let yaml = serde_yaml::to_string(&config)?;
        print!("{yaml}");
    }
    Ok(())
}

fn path(home: &Path, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(home);

    if json {
        print_json(&serde_json::json!({ "path": path, "exists": path.exists() }))?;
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn init(home: &Path, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(home);
    let created = !path.exists();
    if created {
        Config::default()
            .save(home)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        print_json(&serde_json::json!({ "path": path, "created": created }))?;
    } else if created {
        println!("Wrote default config to {}", path.display());
    } else {
        println!("{} already exists", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(home: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(home).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
