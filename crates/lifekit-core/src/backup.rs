//! Backups of user-chosen files and directories into checksummed `.tar.gz`
//! archives, with history, verification, restore and pruning.

use crate::error::{LifeError, Result};
use crate::io;
use crate::paths;
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: u64,
    pub path: PathBuf,
    /// Top-level directory name inside the archive.
    pub name: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: u64,
    pub file: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size: u64,
    pub files: usize,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Names of the sources that made it into the archive.
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackupBook {
    #[serde(default)]
    pub next_source_id: IdSeq,
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub backups: Vec<BackupRecord>,
}

impl Document for BackupBook {
    const FILE: &'static str = "backup.json";
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupStats {
    pub sources: usize,
    pub backups: usize,
    pub total_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_backup: Option<DateTime<Utc>>,
}

impl BackupBook {
    pub fn add_source(&mut self, path: &Path, name: Option<&str>) -> Result<&Source> {
        if !path.exists() {
            return Err(LifeError::not_found("path", path.display()));
        }
        let path = path.canonicalize()?;
        if self.sources.iter().any(|s| s.path == path) {
            return Err(LifeError::exists("source", path.display()));
        }
        let name = match name {
            Some(n) => n.trim().to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "root".to_string()),
        };
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(LifeError::InvalidInput(format!(
                "invalid source name '{name}': must be a single path component"
            )));
        }
        if self.sources.iter().any(|s| s.name == name) {
            return Err(LifeError::exists("source name", name));
        }
        let id = self.next_source_id.next(self.sources.iter().map(|s| s.id));
        self.sources.push(Source {
            id,
            path,
            name,
            added_at: Utc::now(),
        });
        Ok(&self.sources[self.sources.len() - 1])
    }

    pub fn remove_source(&mut self, id: u64) -> Result<Source> {
        let pos = self
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| LifeError::not_found("source", id))?;
        Ok(self.sources.remove(pos))
    }

    pub fn get(&self, id: u64) -> Result<&BackupRecord> {
        self.backups
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| LifeError::not_found("backup", id))
    }

    pub fn stats(&self) -> BackupStats {
        BackupStats {
            sources: self.sources.len(),
            backups: self.backups.len(),
            total_size: self.backups.iter().map(|b| b.size).sum(),
            last_backup: self.backups.iter().map(|b| b.created_at).max(),
        }
    }
}

pub fn load(home: &Path) -> Result<BackupBook> {
    store::load(home)
}

// ---------------------------------------------------------------------------
// Archive operations
// ---------------------------------------------------------------------------

/// Archive every source into `dest`. Sources that no longer exist are skipped
/// with a warning; if none remain nothing is written.
pub fn run(
    home: &Path,
    dest: &Path,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<BackupRecord> {
    store::update(home, |book: &mut BackupBook| {
        let present: Vec<&Source> = book
            .sources
            .iter()
            .filter(|s| {
                let exists = s.path.exists();
                if !exists {
                    tracing::warn!(source = %s.path.display(), "backup source missing, skipping");
                }
                exists
            })
            .collect();
        if present.is_empty() {
            return Err(LifeError::InvalidInput(
                "nothing to back up: add a source with `lk backup add-source <path>`".into(),
            ));
        }

        io::ensure_dir(dest)?;
        let id = book.next_id.next(book.backups.iter().map(|b| b.id));
        let file = dest.join(format!(
            "lifekit-backup-{id}-{}.tar.gz",
            now.format("%Y%m%d-%H%M%S")
        ));

        let skip = dest.canonicalize()?;
        let files = match write_archive(&file, &present, &skip) {
            Ok(n) => n,
            Err(e) => {
                if let Err(rm) = std::fs::remove_file(&file) {
                    tracing::warn!(
                        file = %file.display(),
                        error = %rm,
                        "could not remove partial archive"
                    );
                }
                return Err(e);
            }
        };

        let record = BackupRecord {
            id,
            size: std::fs::metadata(&file)?.len(),
            sha256: sha256_file(&file)?,
            file,
            created_at: now,
            files,
            note: note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            sources: present.iter().map(|s| s.name.clone()).collect(),
        };
        tracing::debug!(id, file = %record.file.display(), "backup written");
        book.backups.push(record.clone());
        Ok(record)
    })
}

/// Recompute the archive checksum and compare it with the recorded one.
pub fn verify(home: &Path, id: u64) -> Result<BackupRecord> {
    let book = load(home)?;
    let record = book.get(id)?;
    check_archive(record)?;
    Ok(record.clone())
}

fn check_archive(record: &BackupRecord) -> Result<()> {
    if !record.file.exists() {
        return Err(LifeError::not_found("archive", record.file.display()));
    }
    let actual = sha256_file(&record.file)?;
    if actual != record.sha256 {
        return Err(LifeError::ChecksumMismatch {
            file: record.file.display().to_string(),
            expected: record.sha256.clone(),
            actual,
        });
    }
    Ok(())
}

/// Extract a verified archive into `target` (default `<home>/restores/<id>`).
/// Refuses to extract into a non-empty directory.
pub fn restore(home: &Path, id: u64, target: Option<&Path>) -> Result<PathBuf> {
    let book = load(home)?;
    let record = book.get(id)?;
    let target = target
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::restore_dir(home, id));
    if target.exists() && std::fs::read_dir(&target)?.next().is_some() {
        return Err(LifeError::InvalidInput(format!(
            "restore target {} is not empty",
            target.display()
        )));
    }
    check_archive(record)?;
    io::ensure_dir(&target)?;
    let decoder = GzDecoder::new(File::open(&record.file)?);
    tar::Archive::new(decoder).unpack(&target)?;
    Ok(target)
}

/// Delete the oldest archives so that at most `keep` remain. Returns the
/// removed records.
pub fn prune(home: &Path, keep: usize) -> Result<Vec<BackupRecord>> {
    store::update(home, |book: &mut BackupBook| {
        book.backups.sort_by_key(|b| (b.created_at, b.id));
        let excess = book.backups.len().saturating_sub(keep);
        let removed: Vec<BackupRecord> = book.backups.drain(..excess).collect();
        for r in &removed {
            match std::fs::remove_file(&r.file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(file = %r.file.display(), "archive already gone");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    })
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write every source into a new gzip tarball at `file`. Returns the number of
/// files archived.
fn write_archive(file: &Path, sources: &[&Source], skip: &Path) -> Result<usize> {
    let encoder = GzEncoder::new(File::create(file)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut files = 0;
    for source in sources {
        files += append_tree(&mut builder, Path::new(&source.name), &source.path, skip)?;
    }
    builder.into_inner()?.finish()?;
    Ok(files)
}

/// Recursively append `path` under `name`. Anything inside `skip` (the
/// destination directory) is left out so an archive never contains itself.
fn append_tree<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    name: &Path,
    path: &Path,
    skip: &Path,
) -> Result<usize> {
    if path.starts_with(skip) {
        tracing::debug!(path = %path.display(), "skipping backup destination");
        return Ok(0);
    }
    if !path.is_dir() {
        builder.append_path_with_name(path, name)?;
        return Ok(1);
    }
    builder.append_dir(name, path)?;
    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();
    let mut count = 0;
    for entry in entries {
        if let Some(file_name) = entry.file_name() {
            count += append_tree(builder, &name.join(file_name), &entry, skip)?;
        }
    }
    Ok(count)
}

/// "1.4 MB" style sizes for listings.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("docs");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("a.txt"), "alpha").unwrap();
        std::fs::write(src.join("sub/b.txt"), "beta").unwrap();
        (dir, src)
    }

    fn home(dir: &TempDir) -> PathBuf {
        dir.path().join("home")
    }

    #[test]
    fn add_source_rules() {
        let (dir, src) = setup();
        let mut book = BackupBook::default();
        book.add_source(&src, None).unwrap();
        assert_eq!(book.sources[0].name, "docs");
        assert!(matches!(
            book.add_source(&src, Some("other")),
            Err(LifeError::AlreadyExists { .. })
        ));
        assert!(matches!(
            book.add_source(&dir.path().join("missing"), None),
            Err(LifeError::NotFound { .. })
        ));
        assert!(book.add_source(dir.path(), Some("a/b")).is_err());
    }

    #[test]
    fn run_verify_restore_round_trip() {
        let (dir, src) = setup();
        let home = home(&dir);
        store::update(&home, |b: &mut BackupBook| b.add_source(&src, None).map(|_| ())).unwrap();

        let record = run(&home, &paths::backups_dir(&home), Some("first"), Utc::now()).unwrap();
        assert_eq!(record.files, 2);
        assert_eq!(record.sha256.len(), 64);
        verify(&home, record.id).unwrap();

        let target = restore(&home, record.id, None).unwrap();
        assert_eq!(target, paths::restore_dir(&home, record.id));
        assert_eq!(std::fs::read_to_string(target.join("docs/a.txt")).unwrap(), "alpha");
        assert_eq!(std::fs::read_to_string(target.join("docs/sub/b.txt")).unwrap(), "beta");

        // A second restore into the same place is refused.
        assert!(restore(&home, record.id, None).is_err());
    }

    #[test]
    fn tampered_archive_fails_verification() {
        let (dir, src) = setup();
        let home = home(&dir);
        store::update(&home, |b: &mut BackupBook| b.add_source(&src, None).map(|_| ())).unwrap();
        let record = run(&home, &paths::backups_dir(&home), None, Utc::now()).unwrap();
        std::fs::write(&record.file, b"garbage").unwrap();
        assert!(matches!(
            verify(&home, record.id),
            Err(LifeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn missing_sources_skipped_then_error() {
        let (dir, src) = setup();
        let home = home(&dir);
        let extra = dir.path().join("extra.txt");
        std::fs::write(&extra, "x").unwrap();
        store::update(&home, |b: &mut BackupBook| {
            b.add_source(&src, None)?;
            b.add_source(&extra, None).map(|_| ())
        })
        .unwrap();
        std::fs::remove_file(&extra).unwrap();
        let record = run(&home, &paths::backups_dir(&home), None, Utc::now()).unwrap();
        assert_eq!(record.sources, vec!["docs"]);

        std::fs::remove_dir_all(&src).unwrap();
        assert!(run(&home, &paths::backups_dir(&home), None, Utc::now()).is_err());
        assert_eq!(load(&home).unwrap().backups.len(), 1);
    }

    #[test]
    fn destination_inside_source_is_not_archived() {
        let (dir, src) = setup();
        let home = home(&dir);
        store::update(&home, |b: &mut BackupBook| b.add_source(&src, None).map(|_| ())).unwrap();

        let dest = src.join("backups");
        let first = run(&home, &dest, None, Utc::now()).unwrap();
        let second = run(&home, &dest, None, Utc::now() + Duration::seconds(1)).unwrap();
        assert_eq!(first.files, 2);
        assert_eq!(second.files, 2);

        let target = restore(&home, second.id, None).unwrap();
        assert!(target.join("docs/a.txt").exists());
        assert!(!target.join("docs/backups").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_run_leaves_no_partial_archive() {
        let (dir, src) = setup();
        let home = home(&dir);
        std::os::unix::fs::symlink(dir.path().join("gone"), src.join("dangling")).unwrap();
        store::update(&home, |b: &mut BackupBook| b.add_source(&src, None).map(|_| ())).unwrap();

        let dest = paths::backups_dir(&home);
        assert!(run(&home, &dest, None, Utc::now()).is_err());
        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
        assert!(load(&home).unwrap().backups.is_empty());
    }

    #[test]
    fn prune_keeps_newest() {
        let (dir, src) = setup();
        let home = home(&dir);
        store::update(&home, |b: &mut BackupBook| b.add_source(&src, None).map(|_| ())).unwrap();
        let t0 = Utc::now();
        let dest = paths::backups_dir(&home);
        let records: Vec<BackupRecord> = (0..3)
            .map(|i| run(&home, &dest, None, t0 + Duration::seconds(i)).unwrap())
            .collect();
        let removed = prune(&home, 1).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!records[0].file.exists());
        assert!(records[2].file.exists());
        let book = load(&home).unwrap();
        assert_eq!(book.backups.len(), 1);
        assert_eq!(book.backups[0].id, records[2].id);
        assert_eq!(book.stats().backups, 1);
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
