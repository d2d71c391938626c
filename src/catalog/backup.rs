//! Snapshot of a catalog file taken before it is overwritten.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::catalog::store::CatalogError;
use crate::core::UnixTime;

/// Holds a copy of the file at `target` for the duration of a write.
///
/// Call [`BackupGuard::commit`] once the new content is in place. A guard that
/// is dropped uncommitted copies the snapshot back over `target`.
#[derive(Debug)]
pub struct BackupGuard {
    target: PathBuf,
    backup: Option<PathBuf>,
    committed: bool,
}

/// `catalog.json` -> `catalog.bak.<ts>.json`
#[must_use]
pub fn backup_path(target: &Path, timestamp: UnixTime) -> PathBuf {
    numbered_backup_path(target, timestamp, 0)
}

/// `backup_path` for `attempt == 0`, then `catalog.bak.<ts>.<attempt>.json`
fn numbered_backup_path(target: &Path, timestamp: UnixTime, attempt: u32) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    if attempt == 0 {
        target.with_file_name(format!("{stem}.bak.{timestamp}.json"))
    } else {
        target.with_file_name(format!("{stem}.bak.{timestamp}.{attempt}.json"))
    }
}

/// Copy `target` to the first free backup name. Existing snapshots are never
/// overwritten.
fn snapshot(target: &Path, timestamp: UnixTime) -> std::io::Result<PathBuf> {
    let mut source = File::open(target)?;
    let mut attempt = 0;
    loop {
        let dest = numbered_backup_path(target, timestamp, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&dest) {
            Ok(mut file) => {
                std::io::copy(&mut source, &mut file)?;
                file.sync_all()?;
                return Ok(dest);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

impl BackupGuard {
    /// Snapshot `target` if it exists.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Backup` if the copy fails.
    pub fn acquire(target: &Path, timestamp: UnixTime) -> Result<Self, CatalogError> {
        let backup = if target.exists() {
            let dest = snapshot(target, timestamp).map_err(|source| CatalogError::Backup {
                path: target.display().to_string(),
                source,
            })?;
            tracing::info!("Backed up {} to {}", target.display(), dest.display());
            Some(dest)
        } else {
            None
        };

        Ok(Self {
            target: target.to_path_buf(),
            backup,
            committed: false,
        })
    }

    #[must_use]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Confirm the write succeeded; returns where the snapshot lives
    pub fn commit(mut self) -> Option<PathBuf> {
        self.committed = true;
        self.backup.take()
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(backup) = &self.backup {
            match std::fs::copy(backup, &self.target) {
                Ok(_) => tracing::warn!(
                    "Write to {} not confirmed; restored from {}",
                    self.target.display(),
                    backup.display()
                ),
                Err(e) => tracing::error!(
                    "Failed to restore {} from {}: {}",
                    self.target.display(),
                    backup.display(),
                    e
                ),
            }
        }
    }
}
