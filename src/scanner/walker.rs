//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! [`Walker`] traverses a directory tree and yields one [`FileEntry`] per
//! regular file. Children of every directory are visited in file-name order,
//! so the same tree always produces the same sequence, and each entry carries
//! its position in that sequence as [`FileEntry::index`].
//!
//! # Rules
//!
//! - Directory symlinks are never followed (no cycles).
//! - File symlinks are yielded and hashed by their target's content.
//! - Dangling symlinks are yielded with size 0; hashing them fails later.
//! - Excluded directories are pruned; excluded files are never yielded.
//! - FIFOs, sockets and devices are skipped.
//! - Unreadable directories are reported as [`ScanError`] and skipped.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, FileId, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for deterministic file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Paths skipped by exclusion rules during the last walk
    excluded: AtomicUsize,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupsweep::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
            excluded: AtomicUsize::new(0),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// The walk stops before the next entry once the flag is set.
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

    /// Number of paths skipped by exclusion rules so far.
    ///
    /// A pruned directory counts once, regardless of its contents.
    #[must_use]
    pub fn excluded_count(&self) -> usize {
        self.excluded.load(Ordering::Relaxed)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        if self.config.is_excluded(entry.path()) {
            log::debug!("Excluding directory: {}", entry.path().display());
            self.excluded.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding file entries in discovery order.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupsweep::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        self.excluded.store(0, Ordering::Relaxed);
        let mut next_index = 0usize;

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.keep_entry(entry))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| {
                let result = match entry_result {
                    Ok(entry) => self.process_entry(&entry, next_index)?,
                    Err(e) => Err(self.handle_walk_error(e)),
                };
                if let Ok(ref file) = result {
                    next_index += 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(next_index, file.path.to_string_lossy().as_ref());
                    }
                }
                Some(result)
            })
    }

    /// Turn a directory entry into a FileEntry, or `None` when it is skipped.
    fn process_entry(
        &self,
        entry: &DirEntry,
        index: usize,
    ) -> Option<Result<FileEntry, ScanError>> {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if self.config.is_excluded(path) {
            log::trace!("Excluding file: {}", path.display());
            self.excluded.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        if file_type.is_symlink() {
            return self.process_symlink(path, index);
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                let error = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                return Some(Err(self.handle_io_error(path, error)));
            }
        };

        self.regular_file(path, &metadata, index, false)
    }

    fn process_symlink(&self, path: &Path, index: usize) -> Option<Result<FileEntry, ScanError>> {
        match std::fs::metadata(path) {
            Ok(target) if target.is_dir() => {
                log::trace!("Not following directory symlink: {}", path.display());
                None
            }
            Ok(target) => self.regular_file(path, &target, index, true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Dangling symlink: {}", path.display());
                Some(Ok(FileEntry {
                    path: path.to_path_buf(),
                    size: 0,
                    index,
                    is_symlink: true,
                    file_id: None,
                }))
            }
            Err(e) => Some(Err(self.handle_io_error(path, e))),
        }
    }

    fn regular_file(
        &self,
        path: &Path,
        metadata: &Metadata,
        index: usize,
        is_symlink: bool,
    ) -> Option<Result<FileEntry, ScanError>> {
        if !metadata.is_file() {
            log::debug!("Skipping special file: {}", path.display());
            return None;
        }

        let size = metadata.len();
        if let Some(max) = self.config.max_size {
            if size > max {
                log::trace!(
                    "Skipping file due to size filter ({}): {}",
                    size,
                    path.display()
                );
                return None;
            }
        }

        Some(Ok(FileEntry {
            path: path.to_path_buf(),
            size,
            index,
            is_symlink,
            file_id: FileId::from_metadata(metadata),
        }))
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => log::warn!("Permission denied: {}", path.display()),
            std::io::ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => log::warn!("I/O error for {}: {}", path.display(), error),
        }
        ScanError::from_io(path, error)
    }

    /// Handle walkdir errors (unreadable directories, vanished entries).
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);
        let io_error = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
        ScanError::from_io(&path, io_error)
    }
}
