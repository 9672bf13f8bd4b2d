/// Directory scanning.
///
/// Produces the immutable snapshot of regular files that every organization
/// mode works from. Scanning is one level deep: subdirectories (including the
/// category folders of a previous run) are never entered.
use crate::config::CompiledFilters;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// A regular file as seen at scan time.
///
/// Entries are never re-stat'd during a run; size and modification time are
/// the values observed when the directory was listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Full path of the file inside the target directory.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    #[serde(serialize_with = "serialize_local_time")]
    pub modified: SystemTime,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }

    /// Builds an entry from a path by reading its metadata once.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    /// The modification time in the local time zone, or `None` when it lies
    /// outside the range chrono can represent.
    pub fn modified_local(&self) -> Option<DateTime<Local>> {
        local_time(self.modified)
    }

    /// The final path component, lossily converted for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn local_time(time: SystemTime) -> Option<DateTime<Local>> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(since) => (i64::try_from(since.as_secs()).ok()?, since.subsec_nanos()),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?.checked_neg()?;
            match before.subsec_nanos() {
                0 => (secs, 0),
                nanos => (secs.checked_sub(1)?, 1_000_000_000 - nanos),
            }
        }
    };
    DateTime::from_timestamp(secs, nanos).map(|utc| utc.with_timezone(&Local))
}

fn serialize_local_time<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    match local_time(*time) {
        Some(local) => serializer.serialize_str(&local.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

/// The directory itself could not be listed. Fatal for the run.
#[derive(Debug, Error)]
#[error("Failed to read directory {}: {source}", path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Lists the regular files directly inside `dir`.
///
/// Files rejected by `filters` and any path listed in `excluded` (the tool's
/// own log file, for instance) are left out. Entries whose metadata cannot be
/// read are skipped with a warning. The result is sorted by path.
///
/// # Errors
///
/// Returns [`ScanError`] if the directory cannot be enumerated.
pub fn scan_directory(
    dir: &Path,
    filters: &CompiledFilters,
    excluded: &[PathBuf],
) -> Result<Vec<FileEntry>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();

        // Follows symlinks, so a link to a regular file counts as a file.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        if excluded.iter().any(|skip| skip == &path) {
            debug!("Excluding own file {}", path.display());
            continue;
        }
        if !filters.should_include(&path) {
            debug!("Filtered out {}", path.display());
            continue;
        }

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Skipping {}: no modification time ({})", path.display(), e);
                continue;
            }
        };
        files.push(FileEntry::new(path, metadata.len(), modified));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
