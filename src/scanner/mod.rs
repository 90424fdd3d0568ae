//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Deterministic directory walking using walkdir
//! - Exclusion of paths by substring or path segment
//! - Streaming content digests (SHA-256 or BLAKE3)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Chunked file hashing
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_excluded(vec![".git".to_string()]);
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("#{} {}: {} bytes", file.index, file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

// Re-export main types
pub use hasher::{
    hash_to_hex, hex_to_hash, Digest, HashAlgorithm, Hasher, HasherConfig, DEFAULT_CHUNK_SIZE,
    MAX_CHUNK_SIZE,
};
pub use hardlink::FileId;
pub use walker::Walker;

/// Excluded strings used when nothing else is configured.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", "__pycache__", "node_modules"];

/// Metadata for a discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path to the file, as discovered under the scan root
    pub path: PathBuf,
    /// File size in bytes (size of the link target for symlinks, 0 if dangling)
    pub size: u64,
    /// Discovery sequence number assigned by the walker
    pub index: usize,
    /// Whether this entry is a symbolic link to a file
    pub is_symlink: bool,
    /// Identity of the data on disk; hardlinks and symlinks share their target's
    #[serde(default, skip_serializing)]
    pub file_id: Option<FileId>,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `index` - Position in walk order
    #[must_use]
    pub fn new(path: PathBuf, size: u64, index: usize) -> Self {
        Self {
            path,
            size,
            index,
            is_symlink: false,
            file_id: None,
        }
    }

    /// Attach the on-disk identity of the file.
    #[must_use]
    pub fn with_file_id(mut self, file_id: Option<FileId>) -> Self {
        self.file_id = file_id;
        self
    }
}

/// How excluded strings are matched against a path.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExcludeMode {
    /// Exclude when the string occurs anywhere in the full path string.
    ///
    /// `venv` also matches `my_venvault.txt`.
    #[default]
    Substring,
    /// Exclude only when the string equals one whole path component.
    Segment,
}

impl ExcludeMode {
    /// Check whether `path` is excluded by any of `excluded`.
    ///
    /// Empty strings never match.
    #[must_use]
    pub fn is_excluded(self, path: &Path, excluded: &[String]) -> bool {
        match self {
            Self::Substring => {
                let path_str = path.to_string_lossy();
                excluded
                    .iter()
                    .any(|s| !s.is_empty() && path_str.contains(s.as_str()))
            }
            Self::Segment => path.components().any(|component| match component {
                Component::Normal(name) => excluded
                    .iter()
                    .any(|s| !s.is_empty() && name == std::ffi::OsStr::new(s)),
                _ => false,
            }),
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Strings that exclude a path when matched (see [`ExcludeMode`]).
    pub excluded: Vec<String>,

    /// How `excluded` is matched.
    pub exclude_mode: ExcludeMode,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(excluded: Vec<String>, exclude_mode: ExcludeMode, max_size: Option<u64>) -> Self {
        Self {
            excluded,
            exclude_mode,
            max_size,
        }
    }

    /// Set the excluded strings.
    #[must_use]
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Set the exclusion matching mode.
    #[must_use]
    pub fn with_exclude_mode(mut self, mode: ExcludeMode) -> Self {
        self.exclude_mode = mode;
        self
    }

    /// The built-in default exclusion list.
    #[must_use]
    pub fn default_excludes() -> Vec<String> {
        DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect()
    }

    /// Check whether a path is excluded by this configuration.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_mode.is_excluded(path, &self.excluded)
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was not found (vanished, or a dangling symlink).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// Hashing exceeded the per-file deadline.
    #[error("Hashing timed out after {seconds:.1}s: {path}")]
    TimedOut {
        /// File being hashed
        path: PathBuf,
        /// Elapsed seconds when the deadline was noticed
        seconds: f64,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::TimedOut { path, .. } | Self::Io { path, .. } => path,
        }
    }
}
