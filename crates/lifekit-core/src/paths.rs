use crate::error::{LifeError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const HOME_DIR_NAME: &str = ".lifekit";
pub const HOME_ENV: &str = "LIFEKIT_HOME";

pub const DATA_DIR: &str = "data";
pub const BACKUPS_DIR: &str = "backups";
pub const RESTORES_DIR: &str = "restores";
pub const TEMPLATES_DIR: &str = "templates";

pub const CONFIG_FILE: &str = "config.yaml";

pub const TIMELOG_CSV: &str = "timelog.csv";
pub const TIMELOG_ACTIVE: &str = "timelog-active.json";
pub const FOCUS_HISTORY_CSV: &str = "focus-history.csv";
pub const FOCUS_ACTIVE: &str = "focus-active.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `~/.lifekit`, used when neither `--home` nor `LIFEKIT_HOME` is set.
pub fn default_home() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(HOME_DIR_NAME))
        .ok_or(LifeError::HomeNotFound)
}

pub fn data_dir(home: &Path) -> PathBuf {
    home.join(DATA_DIR)
}

pub fn data_file(home: &Path, file: &str) -> PathBuf {
    data_dir(home).join(file)
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}

pub fn backups_dir(home: &Path) -> PathBuf {
    home.join(BACKUPS_DIR)
}

pub fn restore_dir(home: &Path, backup_id: u64) -> PathBuf {
    home.join(RESTORES_DIR).join(backup_id.to_string())
}

pub fn templates_dir(home: &Path) -> PathBuf {
    home.join(TEMPLATES_DIR)
}

pub fn timelog_csv(home: &Path) -> PathBuf {
    data_file(home, TIMELOG_CSV)
}

pub fn timelog_active(home: &Path) -> PathBuf {
    data_file(home, TIMELOG_ACTIVE)
}

pub fn focus_history_csv(home: &Path) -> PathBuf {
    data_file(home, FOCUS_HISTORY_CSV)
}

pub fn focus_active(home: &Path) -> PathBuf {
    data_file(home, FOCUS_ACTIVE)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9\-_]*[a-z0-9]$|^[a-z0-9]$").expect("static regex")
    })
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(LifeError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["my-app", "a", "tool_2", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-dash", "dash-", "has spaces", "UPPER", "../escape"] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn path_helpers() {
        let home = Path::new("/tmp/lk");
        assert_eq!(config_path(home), PathBuf::from("/tmp/lk/config.yaml"));
        assert_eq!(
            data_file(home, "tasks.json"),
            PathBuf::from("/tmp/lk/data/tasks.json")
        );
        assert_eq!(restore_dir(home, 3), PathBuf::from("/tmp/lk/restores/3"));
        assert_eq!(
            focus_history_csv(home),
            PathBuf::from("/tmp/lk/data/focus-history.csv")
        );
    }
}
