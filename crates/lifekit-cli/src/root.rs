use lifekit_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the lifekit home directory.
///
/// Priority:
/// 1. `--home` flag / `LIFEKIT_HOME` env var (passed in as `explicit`)
/// 2. `~/.lifekit`
pub fn resolve_home(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    Ok(paths::default_home()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_home_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_home(Some(dir.path())).unwrap();
        assert_eq!(result, dir.path());
    }

    #[test]
    fn default_home_ends_with_lifekit() {
        if let Ok(home) = resolve_home(None) {
            assert!(home.ends_with(paths::HOME_DIR_NAME));
        }
    }
}
