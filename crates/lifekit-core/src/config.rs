use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BackupConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Where archives are written. `None` means `<home>/backups`.
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// How many archives `backup prune` keeps.
    #[serde(default = "default_keep")]
    pub keep: usize,
}

fn default_keep() -> usize {
    10
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            destination: None,
            keep: default_keep(),
        }
    }
}

impl BackupConfig {
    pub fn destination_for(&self, home: &Path) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| paths::backups_dir(home))
    }
}

// ---------------------------------------------------------------------------
// FocusConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_focus_minutes")]
    pub default_minutes: u32,
    #[serde(default = "default_true")]
    pub notify: bool,
}

fn default_focus_minutes() -> u32 {
    25
}

fn default_true() -> bool {
    true
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_focus_minutes(),
            notify: true,
        }
    }
}

// ---------------------------------------------------------------------------
// JournalConfig / TimelogConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Replaces the built-in writing prompts when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelogConfig {
    #[serde(default = "default_true")]
    pub week_starts_monday: bool,
}

impl Default for TimelogConfig {
    fn default() -> Self {
        Self {
            week_starts_monday: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub timelog: TimelogConfig,
}

impl Config {
    /// Load `<home>/config.yaml`. A missing or empty file yields the defaults.
    pub fn load(home: &Path) -> Result<Self> {
        let path = paths::config_path(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        let path = paths::config_path(home);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.backup.keep == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "backup.keep is 0: prune would delete every archive".to_string(),
            });
        }

        if let Some(dest) = &self.backup.destination {
            if dest.as_os_str().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "backup.destination is empty".to_string(),
                });
            } else if dest.is_relative() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "backup.destination '{}' is relative; it resolves against the current directory",
                        dest.display()
                    ),
                });
            }
        }

        if self.focus.default_minutes == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "focus.default_minutes must be at least 1".to_string(),
            });
        } else if self.focus.default_minutes > 240 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "focus.default_minutes={} (>240 is unusual)",
                    self.focus.default_minutes
                ),
            });
        }

        if self.journal.prompts.iter().any(|p| p.trim().is_empty()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "journal.prompts contains an empty prompt".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
