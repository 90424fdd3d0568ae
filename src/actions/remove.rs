//! Duplicate removal.
//!
//! # Overview
//!
//! [`remove_duplicates`] walks a list of [`DuplicateGroup`]s and deletes
//! members according to a [`RemovalConfig`]:
//! - Keep-first (default): `files[0]` of each group survives, the rest go
//! - Delete-all: every member goes, leaving zero copies
//! - Dry run: nothing is touched, would-be deletions are reported
//!
//! When a kept original is a symlink, the group member it resolves to is
//! kept as well ([`RemovalOutcome::KeptLinkTarget`]). Freed bytes count
//! only data that actually leaves the disk: removing a symlink, or one name
//! of a file with other hardlinks, frees nothing.
//!
//! Every file gets exactly one [`RemovalOutcome`] in the returned
//! [`RemovalReport`]. A failed deletion is recorded and processing moves on
//! to the next file; nothing here aborts the batch.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::{remove_duplicates, RemovalConfig};
//! use dupsweep::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//!
//! let report = remove_duplicates(&groups, &RemovalConfig::default().with_dry_run(true));
//! println!("{}", report.summary());
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::DuplicateGroup;
use crate::progress::{ProgressCallback, PHASE_REMOVING};
use crate::scanner::hardlink::{link_count, FileId};

/// Error type for a single file removal.
#[derive(Debug, Error)]
pub enum RemovalError {
    /// File was not found (already deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Path that could not be trashed
        path: PathBuf,
        /// Message from the platform trash
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl RemovalError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// Unlink the file. Cannot be undone.
    #[default]
    Permanent,
    /// Move the file to the platform trash.
    Trash,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOutcome {
    /// Retained as the group's original.
    Kept,
    /// Retained because the kept original is a symlink resolving to it.
    KeptLinkTarget,
    /// Deleted (or trashed).
    Deleted,
    /// Would have been deleted; dry run.
    WouldDelete,
    /// Already gone when its turn came.
    SkippedMissing,
    /// The filesystem refused the deletion.
    SkippedPermissionDenied,
    /// Any other failure, with its message.
    SkippedError(String),
}

impl RemovalOutcome {
    /// Whether the file was deliberately left in place.
    #[must_use]
    pub fn is_kept(&self) -> bool {
        matches!(self, Self::Kept | Self::KeptLinkTarget)
    }

    /// Whether this outcome counts as a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SkippedPermissionDenied | Self::SkippedError(_))
    }
}

impl From<RemovalError> for RemovalOutcome {
    fn from(error: RemovalError) -> Self {
        match error {
            RemovalError::NotFound(_) => Self::SkippedMissing,
            RemovalError::PermissionDenied(_) => Self::SkippedPermissionDenied,
            other => Self::SkippedError(other.to_string()),
        }
    }
}

/// Outcome for one file, with the group it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalEntry {
    /// Position of the group in the input list
    pub group: usize,
    /// File path
    pub path: PathBuf,
    /// Size recorded at scan time
    pub size: u64,
    /// What happened
    pub outcome: RemovalOutcome,
}

/// Report of one removal run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReport {
    /// Per-file outcomes in processing order
    pub entries: Vec<RemovalEntry>,
    /// Bytes actually freed by deletions
    pub bytes_freed: u64,
    /// Bytes a dry run would free
    #[serde(default)]
    pub bytes_would_free: u64,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Whether the run stopped early on shutdown
    pub interrupted: bool,
}

impl RemovalReport {
    fn count(&self, predicate: impl Fn(&RemovalOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }

    /// Number of files kept.
    #[must_use]
    pub fn kept_count(&self) -> usize {
        self.count(RemovalOutcome::is_kept)
    }

    /// Number of files deleted.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.count(|o| *o == RemovalOutcome::Deleted)
    }

    /// Number of files a dry run would delete.
    #[must_use]
    pub fn would_delete_count(&self) -> usize {
        self.count(|o| *o == RemovalOutcome::WouldDelete)
    }

    /// Number of files skipped because they were already gone.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.count(|o| *o == RemovalOutcome::SkippedMissing)
    }

    /// Number of files that could not be deleted.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.count(RemovalOutcome::is_failure)
    }

    /// Whether any deletion failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Failed entries.
    pub fn failures(&self) -> impl Iterator<Item = &RemovalEntry> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }

    /// Human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = if self.dry_run {
            format!(
                "Dry run: would delete {} file(s), freeing {}",
                self.would_delete_count(),
                ByteSize(self.bytes_would_free)
            )
        } else {
            format!(
                "Deleted {} file(s), kept {}, freed {}",
                self.deleted_count(),
                self.kept_count(),
                ByteSize(self.bytes_freed)
            )
        };

        let missing = self.missing_count();
        if missing > 0 {
            line.push_str(&format!(", {missing} already missing"));
        }
        let failed = self.failure_count();
        if failed > 0 {
            line.push_str(&format!(", {failed} failed"));
        }
        if self.interrupted {
            line.push_str(" (interrupted)");
        }
        line
    }
}

/// Configuration for a removal run.
#[derive(Clone)]
pub struct RemovalConfig {
    /// Keep the first file of each group.
    pub keep_first: bool,
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
    /// Permanent deletion or trash.
    pub mode: RemovalMode,
    /// Optional shutdown flag, checked before each file.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for RemovalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalConfig")
            .field("keep_first", &self.keep_first)
            .field("dry_run", &self.dry_run)
            .field("mode", &self.mode)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            keep_first: true,
            dry_run: false,
            mode: RemovalMode::Permanent,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl RemovalConfig {
    /// Config that deletes every copy, originals included.
    #[must_use]
    pub fn delete_all() -> Self {
        Self {
            keep_first: false,
            ..Self::default()
        }
    }

    /// Enable/disable keep-first.
    #[must_use]
    pub fn with_keep_first(mut self, keep_first: bool) -> Self {
        self.keep_first = keep_first;
        self
    }

    /// Enable/disable dry run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the removal mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RemovalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// What unlinking one path releases.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    size: u64,
    file_id: Option<FileId>,
    links: u64,
    is_symlink: bool,
}

impl Footprint {
    fn of(path: &Path) -> Result<Self, RemovalError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| RemovalError::from_io(path, e))?;
        Ok(Self {
            size: metadata.len(),
            file_id: FileId::from_metadata(&metadata),
            links: link_count(&metadata),
            is_symlink: metadata.file_type().is_symlink(),
        })
    }

    /// Bytes freed once `pending` other names of this file are also gone.
    fn freed(&self, pending: u64) -> u64 {
        if self.is_symlink || self.links.saturating_sub(pending) > 1 {
            0
        } else {
            self.size
        }
    }
}

/// Permanently delete a single file, returning the bytes freed.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `Io` for any other failure
pub fn permanent_delete(path: &Path) -> Result<u64, RemovalError> {
    let size = Footprint::of(path)?.freed(0);

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        RemovalError::from_io(path, e)
    })?;

    log::info!("Deleted: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Move a single file to the system trash, returning the bytes freed.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<u64, RemovalError> {
    let size = Footprint::of(path)?.freed(0);

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        RemovalError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Dry-run counterpart of a deletion.
///
/// `unlinked` counts names already slated for removal per file, so the last
/// name of a hardlinked file is the one that frees its data.
fn simulate_one(path: &Path, unlinked: &mut HashMap<FileId, u64>) -> (RemovalOutcome, u64) {
    match Footprint::of(path) {
        Ok(footprint) => {
            let pending = match footprint.file_id {
                Some(id) if !footprint.is_symlink => {
                    let count = unlinked.entry(id).or_default();
                    let before = *count;
                    *count += 1;
                    before
                }
                _ => 0,
            };
            log::info!("Would delete: {}", path.display());
            (RemovalOutcome::WouldDelete, footprint.freed(pending))
        }
        Err(e) => (e.into(), 0),
    }
}

fn remove_one(path: &Path, config: &RemovalConfig) -> (RemovalOutcome, u64) {
    let result = match config.mode {
        RemovalMode::Permanent => permanent_delete(path),
        RemovalMode::Trash => delete_to_trash(path),
    };

    match result {
        Ok(freed) => (RemovalOutcome::Deleted, freed),
        Err(RemovalError::NotFound(_)) => {
            log::warn!("File already gone, skipping: {}", path.display());
            (RemovalOutcome::SkippedMissing, 0)
        }
        Err(e) => {
            log::warn!("Could not remove {}: {}", path.display(), e);
            (e.into(), 0)
        }
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Resolved target of the group's original, when the original is a symlink.
fn kept_link_target(group: &DuplicateGroup) -> Option<PathBuf> {
    let original = group.original()?;
    if is_symlink(&original.path) {
        fs::canonicalize(&original.path).ok()
    } else {
        None
    }
}

/// Remove duplicates from `groups` according to `config`.
///
/// Groups are processed in order, members in discovery order. With
/// `keep_first`, `files[0]` of each group is recorded as [`RemovalOutcome::Kept`]
/// and never touched; if it is a symlink, the member it resolves to is
/// recorded as [`RemovalOutcome::KeptLinkTarget`] and never touched either.
#[must_use]
pub fn remove_duplicates(groups: &[DuplicateGroup], config: &RemovalConfig) -> RemovalReport {
    let mut report = RemovalReport {
        dry_run: config.dry_run,
        ..RemovalReport::default()
    };

    let total: usize = groups.iter().map(DuplicateGroup::len).sum();
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_REMOVING, total);
    }

    let mut processed = 0usize;
    let mut unlinked: HashMap<FileId, u64> = HashMap::new();
    'groups: for (group_index, group) in groups.iter().enumerate() {
        let link_target = if config.keep_first {
            kept_link_target(group)
        } else {
            None
        };

        for (position, file) in group.files.iter().enumerate() {
            if config.is_shutdown_requested() {
                log::warn!("Removal interrupted after {processed} of {total} files");
                report.interrupted = true;
                break 'groups;
            }

            let outcome = if config.keep_first && position == 0 {
                log::debug!("Keeping original: {}", file.path.display());
                RemovalOutcome::Kept
            } else if link_target.is_some()
                && !is_symlink(&file.path)
                && fs::canonicalize(&file.path).ok() == link_target
            {
                log::info!(
                    "Keeping {}: the kept original links to it",
                    file.path.display()
                );
                RemovalOutcome::KeptLinkTarget
            } else if config.dry_run {
                let (outcome, freed) = simulate_one(&file.path, &mut unlinked);
                report.bytes_would_free += freed;
                outcome
            } else {
                let (outcome, freed) = remove_one(&file.path, config);
                report.bytes_freed += freed;
                outcome
            };

            report.entries.push(RemovalEntry {
                group: group_index,
                path: file.path.clone(),
                size: file.size,
                outcome,
            });

            processed += 1;
            if let Some(ref callback) = config.progress_callback {
                callback.on_progress(processed, file.path.to_string_lossy().as_ref());
            }
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_REMOVING);
    }

    log::info!("{}", report.summary());
    report
}
