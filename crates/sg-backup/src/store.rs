//! Atomic snapshot store (spec.md §4.3).

use crate::error::BackupError;
use crate::manifest::{Manifest, ManifestEntry};
use chrono::Utc;
use sg_core::{CoreError, Outcome};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: chrono::DateTime<Utc>,
    pub path_count: usize,
    pub size: u64,
}

/// Snapshot store rooted at a configurable directory (default
/// `.ast-grep-backups/`). Writes (create, prune) are serialized by a single
/// mutex; reads (list, restore) run concurrently with each other and with
/// writes, since a restore only reads an already-sealed backup directory.
pub struct BackupStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Maps an original file path onto its location inside a backup
    /// directory, stripping root/prefix components so the mirrored tree is
    /// always relative.
    fn storage_relative_path(path: &Path) -> PathBuf {
        path.components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect()
    }

    /// Reads each file, writes a snapshot into a new backup directory.
    /// Either every file is captured, or nothing is persisted.
    pub fn create(&self, paths: &[PathBuf]) -> Result<String, CoreError> {
        let _guard = self.write_lock.lock().unwrap();
        std::fs::create_dir_all(&self.root).map_err(BackupError::WriteFailed)?;

        // Read every file before writing anything so a mid-run failure
        // leaves the backup root untouched.
        let mut captured = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = std::fs::read(path).map_err(|source| BackupError::ReadFailed {
                path: path.clone(),
                source,
            })?;
            captured.push((path.clone(), bytes));
        }

        let backup_id = self.next_backup_id()?;
        let final_dir = self.root.join(&backup_id);
        let temp_dir = self.root.join(format!(".tmp-{backup_id}"));
        std::fs::create_dir_all(&temp_dir).map_err(BackupError::WriteFailed)?;

        let mut entries = Vec::with_capacity(captured.len());
        for (path, bytes) in &captured {
            let relative = Self::storage_relative_path(path);
            let dest = temp_dir.join(&relative);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(BackupError::WriteFailed)?;
            }
            std::fs::write(&dest, bytes).map_err(BackupError::WriteFailed)?;

            let mut hasher = Sha256::new();
            hasher.update(bytes);
            entries.push(ManifestEntry {
                path: path.clone(),
                hash: hex::encode(hasher.finalize()),
                size: bytes.len() as u64,
            });
        }

        let manifest = Manifest {
            created_at: Utc::now(),
            entries,
        };
        let manifest_json =
            serde_json::to_vec_pretty(&manifest).map_err(|e| BackupError::CorruptManifest(backup_id.clone(), e))?;
        std::fs::write(temp_dir.join(MANIFEST_FILE), manifest_json).map_err(BackupError::WriteFailed)?;

        std::fs::rename(&temp_dir, &final_dir).map_err(BackupError::WriteFailed)?;

        info!(backup_id = %backup_id, files = captured.len(), "backup created");
        Ok(backup_id)
    }

    /// Picks `backup-YYYYMMDD-HHMMSS-mmm`, appending a zero-padded monotonic
    /// suffix if a backup with that exact timestamp already exists.
    fn next_backup_id(&self) -> Result<String, CoreError> {
        let now = Utc::now();
        let base = format!("backup-{}", now.format("%Y%m%d-%H%M%S-%3f"));
        if !self.root.join(&base).exists() {
            return Ok(base);
        }
        for suffix in 1..1000u32 {
            let candidate = format!("{base}-{suffix:03}");
            if !self.root.join(&candidate).exists() {
                return Ok(candidate);
            }
        }
        Err(BackupError::WriteFailed(std::io::Error::other(
            "exhausted monotonic suffixes for this millisecond",
        ))
        .into())
    }

    /// Re-materializes every captured file. Every restoration is attempted
    /// even after an earlier one fails.
    pub fn restore(&self, backup_id: &str) -> Result<Outcome<Vec<PathBuf>>, CoreError> {
        let backup_dir = self.root.join(backup_id);
        if !backup_dir.is_dir() {
            return Err(BackupError::NotFound(backup_id.to_string()).into());
        }

        let manifest = self.read_manifest(backup_id, &backup_dir)?;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for entry in &manifest.entries {
            let relative = Self::storage_relative_path(&entry.path);
            let source = backup_dir.join(&relative);
            match self.restore_one(&source, &entry.path) {
                Ok(()) => succeeded.push(entry.path.to_string_lossy().into_owned()),
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "failed to restore file");
                    failed.push((entry.path.to_string_lossy().into_owned(), e.into()));
                }
            }
        }

        let restored_paths: Vec<PathBuf> = manifest
            .entries
            .iter()
            .map(|e| e.path.clone())
            .filter(|p| succeeded.contains(&p.to_string_lossy().into_owned()))
            .collect();

        if failed.is_empty() {
            Ok(Outcome::Success {
                value: restored_paths,
            })
        } else {
            Ok(Outcome::PartialSuccess {
                value: restored_paths,
                succeeded,
                failed,
            })
        }
    }

    fn restore_one(&self, source: &Path, dest: &Path) -> Result<(), BackupError> {
        let bytes = std::fs::read(source).map_err(|source_err| BackupError::ReadFailed {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(BackupError::WriteFailed)?;
        }
        // Atomic per-file write: temp file + rename.
        let temp = dest.with_extension(format!(
            "{}.restoring",
            dest.extension().and_then(|e| e.to_str()).unwrap_or("tmp")
        ));
        std::fs::write(&temp, &bytes).map_err(BackupError::WriteFailed)?;
        std::fs::rename(&temp, dest).map_err(BackupError::WriteFailed)?;
        Ok(())
    }

    fn read_manifest(&self, backup_id: &str, backup_dir: &Path) -> Result<Manifest, CoreError> {
        let raw = std::fs::read_to_string(backup_dir.join(MANIFEST_FILE))
            .map_err(|source| BackupError::ReadFailed {
                path: backup_dir.join(MANIFEST_FILE),
                source,
            })?;
        serde_json::from_str(&raw)
            .map_err(|e| BackupError::CorruptManifest(backup_id.to_string(), e).into())
    }

    /// Lists all backups, ordered by creation time (backup ids sort
    /// lexicographically in time order).
    pub fn list(&self) -> Result<Vec<BackupInfo>, CoreError> {
        let mut infos = Vec::new();
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(infos),
            Err(e) => return Err(BackupError::WriteFailed(e).into()),
        };

        for entry in read_dir {
            let entry = entry.map_err(BackupError::WriteFailed)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with("backup-") {
                continue;
            }
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            match self.read_manifest(&name, &dir) {
                Ok(manifest) => infos.push(BackupInfo {
                    id: name,
                    created_at: manifest.created_at,
                    path_count: manifest.entries.len(),
                    size: manifest.total_size(),
                }),
                Err(e) => warn!(backup_id = %name, error = %e, "skipping unreadable backup"),
            }
        }

        infos.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(infos)
    }

    /// Prunes backups older than `older_than`, or keeps only the most
    /// recent `keep_last_n`, whichever is supplied. If both are supplied,
    /// a backup is removed if either condition says to remove it.
    pub fn prune(
        &self,
        older_than: Option<chrono::Duration>,
        keep_last_n: Option<usize>,
    ) -> Result<Vec<String>, CoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut infos = self.list()?;
        infos.sort_by(|a, b| b.id.cmp(&a.id)); // newest first

        let keep_ids: HashSet<String> = match keep_last_n {
            Some(n) => infos.iter().take(n).map(|i| i.id.clone()).collect(),
            None => HashSet::new(),
        };

        let now = Utc::now();
        let mut removed = Vec::new();
        for info in &infos {
            if keep_last_n.is_some() && keep_ids.contains(&info.id) {
                continue;
            }
            let too_old = older_than
                .map(|cutoff| now - info.created_at > cutoff)
                .unwrap_or(false);
            let not_kept = keep_last_n.map(|_| !keep_ids.contains(&info.id)).unwrap_or(false);

            if too_old || not_kept {
                let dir = self.root.join(&info.id);
                if std::fs::remove_dir_all(&dir).is_ok() {
                    removed.push(info.id.clone());
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_restore_round_trips_bytes() {
        let workdir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file_path = workdir.path().join("a.py");
        std::fs::write(&file_path, "original").unwrap();

        let store = BackupStore::new(backup_root.path());
        let id = store.create(&[file_path.clone()]).unwrap();

        std::fs::write(&file_path, "mutated").unwrap();
        let outcome = store.restore(&id).unwrap();
        assert!(outcome.is_success());
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "original");
    }

    #[test]
    fn restore_is_idempotent() {
        let workdir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file_path = workdir.path().join("a.py");
        std::fs::write(&file_path, "original").unwrap();

        let store = BackupStore::new(backup_root.path());
        let id = store.create(&[file_path.clone()]).unwrap();

        std::fs::write(&file_path, "mutated-once").unwrap();
        store.restore(&id).unwrap();
        let first = std::fs::read_to_string(&file_path).unwrap();

        std::fs::write(&file_path, "mutated-twice").unwrap();
        store.restore(&id).unwrap();
        let second = std::fs::read_to_string(&file_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "original");
    }

    #[test]
    fn create_fails_without_persisting_on_missing_file() {
        let backup_root = tempdir().unwrap();
        let store = BackupStore::new(backup_root.path());
        let missing = PathBuf::from("/definitely/does/not/exist.py");

        let result = store.create(&[missing]);
        assert!(result.is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_orders_by_creation_time() {
        let workdir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file_path = workdir.path().join("a.py");
        std::fs::write(&file_path, "v1").unwrap();

        let store = BackupStore::new(backup_root.path());
        let first_id = store.create(&[file_path.clone()]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second_id = store.create(&[file_path.clone()]).unwrap();

        let infos = store.list().unwrap();
        assert_eq!(infos.len(), 2);
        assert!(infos[0].id <= infos[1].id);
        assert!(infos.iter().any(|i| i.id == first_id));
        assert!(infos.iter().any(|i| i.id == second_id));
    }

    #[test]
    fn prune_keep_last_n_removes_older_backups() {
        let workdir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file_path = workdir.path().join("a.py");
        std::fs::write(&file_path, "v1").unwrap();

        let store = BackupStore::new(backup_root.path());
        let _first = store.create(&[file_path.clone()]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create(&[file_path.clone()]).unwrap();

        let removed = store.prune(None, Some(1)).unwrap();
        assert_eq!(removed.len(), 1);
        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
    }
}
