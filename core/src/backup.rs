//! Backups taken before a file is overwritten.
//!
//! RULE: No existing backup is ever replaced. `Rename` refuses when
//! `<path>.backup` is already there; `Timestamped` picks a fresh name.

use crate::{
    clock::{Clock, BACKUP_SUFFIX_FORMAT},
    error::{PipelineError, PipelineResult},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const BACKUP_EXTENSION: &str = "backup";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    /// Move the file to `<path>.backup`.
    #[default]
    Rename,
    /// Copy the file to `<path>.backup_YYYYMMDD_HHMMSS`.
    Timestamped,
}

/// `<path>.<suffix>`, keeping the original extension.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// `<path>.backup`.
pub fn plain_backup_path(path: &Path) -> PathBuf {
    with_suffix(path, BACKUP_EXTENSION)
}

/// `<path>.backup_<stamp>`, with `_2`, `_3`, … appended until unused.
pub fn timestamped_backup_path(path: &Path, clock: &dyn Clock) -> PathBuf {
    let stamp = clock.now().format(BACKUP_SUFFIX_FORMAT).to_string();
    let base = format!("{BACKUP_EXTENSION}_{stamp}");
    let mut candidate = with_suffix(path, &base);
    let mut n = 2;
    while candidate.exists() {
        candidate = with_suffix(path, &format!("{base}_{n}"));
        n += 1;
    }
    candidate
}

/// Back up `path` according to `policy`. Returns the backup location,
/// or `None` when there was nothing to back up.
pub fn back_up(path: &Path, policy: BackupPolicy, clock: &dyn Clock) -> PipelineResult<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let io_err = |source| PipelineError::Io { path: path.to_path_buf(), source };

    let target = match policy {
        BackupPolicy::Rename => {
            let target = plain_backup_path(path);
            if target.exists() {
                return Err(PipelineError::BackupExists { path: target });
            }
            std::fs::rename(path, &target).map_err(io_err)?;
            target
        }
        BackupPolicy::Timestamped => {
            let target = timestamped_backup_path(path, clock);
            std::fs::copy(path, &target).map_err(io_err)?;
            target
        }
    };
    log::info!("backup: {} -> {}", path.display(), target.display());
    Ok(Some(target))
}
