use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifeError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("invalid date '{0}': expected YYYY-MM-DD, today, yesterday, tomorrow or ±Nd")]
    InvalidDate(String),

    #[error("invalid percentage '{0}': expected an integer between 0 and 100")]
    InvalidPercentage(String),

    #[error("invalid priority '{0}': expected high, medium or low")]
    InvalidPriority(String),

    #[error("invalid duration '{0}': expected e.g. 25, 25m, 1h30m or 90s")]
    InvalidDuration(String),

    #[error("invalid name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid transition for {kind} {id}: {reason}")]
    InvalidTransition {
        kind: &'static str,
        id: String,
        reason: String,
    },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("required program not found on PATH: {0}")]
    MissingDependency(String),

    #[error("home directory not found: set HOME or LIFEKIT_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LifeError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        LifeError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn exists(kind: &'static str, id: impl ToString) -> Self {
        LifeError::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifeError>;
