//! Duplicate finder: walk, hash, group.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs one scan:
//! 1. **Walk** - collect every non-excluded regular file under the root,
//!    each tagged with its discovery index
//! 2. **Hash** - compute content digests on a bounded rayon pool
//! 3. **Group** - funnel results into a [`DigestAggregator`] and keep
//!    digests shared by two or more files
//!
//! Only a missing or non-directory root is fatal. Unreadable directories
//! and files are logged, recorded in the [`ScanSummary`], and skipped.
//! When the shutdown flag is raised the scan stops between files and
//! returns the groups formed so far, with `summary.interrupted` set.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
//! use dupsweep::scanner::WalkerConfig;
//! use std::path::Path;
//!
//! let config = FinderConfig::default()
//!     .with_walker_config(WalkerConfig::default().with_excluded(WalkerConfig::default_excludes()));
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//! for group in &groups {
//!     println!("{}: {} files", group.hash_hex(), group.len());
//! }
//! println!("Reclaimable: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::{DigestAggregator, DuplicateGroup};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_WALKING};
use crate::scanner::{
    FileEntry, HashError, Hasher, HasherConfig, ScanError, Walker, WalkerConfig,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of worker threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Walker configuration (exclusions, size filter).
    pub walker_config: WalkerConfig,
    /// Hasher configuration (algorithm, chunk size, timeout).
    pub hasher_config: HasherConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("hasher_config", &self.hasher_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            hasher_config: HasherConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the hasher configuration.
    #[must_use]
    pub fn with_hasher_config(mut self, config: HasherConfig) -> Self {
        self.hasher_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
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

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of files discovered (after exclusions and size filter)
    pub total_files: usize,
    /// Total size of discovered files in bytes
    pub total_size: u64,
    /// Number of files whose digest was computed
    pub hashed_files: usize,
    /// Number of files that could not be hashed
    pub failed_files: usize,
    /// Number of paths skipped by exclusion rules
    pub excluded_paths: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Space reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was interrupted (results are partial)
    pub interrupted: bool,
    /// Errors encountered while walking
    pub scan_errors: Vec<ScanError>,
    /// Errors encountered while hashing
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Whether any file or directory was skipped because of an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty() || !self.hash_errors.is_empty()
    }

    /// Calculate the percentage of scanned bytes wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Format total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }

    fn record_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Errors that abort a scan before it starts.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root path could not be inspected.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The hashing thread pool could not be created.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that walks, hashes and groups.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::with_config(config.hasher_config.clone());
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration
    /// (no exclusions, SHA-256, 4 KiB chunks).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` only when the root is missing, not a directory,
    /// or cannot be inspected, or when the hashing pool cannot be built.
    /// An empty group list is a normal result.
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        validate_root(path)?;

        log::info!("Starting duplicate file scan in {}", path.display());

        let mut summary = ScanSummary::default();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
            callback.on_message(&format!("Walking {}", path.display()));
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => summary.scan_errors.push(e),
            }
        }
        summary.excluded_paths = walker.excluded_count();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        log::info!(
            "Found {} files ({}), {} paths excluded",
            files.len(),
            ByteSize(files.iter().map(|f| f.size).sum()),
            summary.excluded_paths
        );

        let groups = self.hash_and_group(files, &mut summary)?;
        summary.scan_duration = start_time.elapsed();

        if summary.interrupted {
            log::warn!(
                "Scan interrupted: {} partial duplicate groups from {} hashed files",
                summary.duplicate_groups,
                summary.hashed_files
            );
        } else {
            log::info!(
                "Found {} groups of duplicate files ({} duplicates, {} reclaimable)",
                summary.duplicate_groups,
                summary.duplicate_files,
                summary.reclaimable_display()
            );
        }

        Ok((groups, summary))
    }

    /// Find duplicates among a pre-collected list of files.
    ///
    /// Files keep their own discovery indices; those decide group order.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::ThreadPool` if the hashing pool cannot be built.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();
        let groups = self.hash_and_group(files, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    fn hash_and_group(
        &self,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_HASHING, files.len());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()?;

        let completed = AtomicUsize::new(0);
        let results: Vec<(FileEntry, Result<_, HashError>)> = pool.install(|| {
            files
                .into_par_iter()
                .filter_map(|file| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    let result = self.hasher.hash_file(&file.path);
                    if let Some(ref callback) = self.config.progress_callback {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(done, file.path.to_string_lossy().as_ref());
                    }
                    Some((file, result))
                })
                .collect()
        });

        let mut aggregator = DigestAggregator::new();
        for (file, result) in results {
            match result {
                Ok(digest) => aggregator.insert(digest, file),
                Err(HashError::Interrupted(_)) => {
                    log::debug!("Hashing interrupted: {}", file.path.display());
                }
                Err(e) => {
                    log::error!("Error reading file {}: {}", file.path.display(), e);
                    summary.failed_files += 1;
                    summary.hash_errors.push(e);
                }
            }
        }
        summary.hashed_files = aggregator.file_count();
        summary.interrupted = self.config.is_shutdown_requested();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_HASHING);
        }

        let groups = aggregator.into_groups();
        summary.record_groups(&groups);
        Ok(groups)
    }
}

fn validate_root(path: &Path) -> Result<(), FinderError> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(FinderError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinderError::PathNotFound(path.to_path_buf()))
        }
        Err(e) => Err(FinderError::IoWithPath {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Scan `root` for duplicates, excluding paths that contain any of `excluded`.
///
/// Uses substring matching and otherwise default settings.
///
/// # Errors
///
/// See [`DuplicateFinder::find_duplicates`].
pub fn find_duplicates(
    root: &Path,
    excluded: &[String],
) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_excluded(excluded.to_vec()));
    DuplicateFinder::new(config).find_duplicates(root)
}
