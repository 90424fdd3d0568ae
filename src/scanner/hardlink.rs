//! Identity of the data behind a path.
//!
//! Two paths with the same [`FileId`] name one file on disk: hardlinks of
//! each other, or a symlink and its target. Removing one of them frees no
//! space, and removing the target of a kept symlink destroys the content
//! the link still points at.
//!
//! # Platform Support
//!
//! - **Unix**: `(device, inode)` from file metadata
//! - **Other**: no identity; every path is treated as its own file
//!
//! ```
//! use dupsweep::scanner::hardlink::{FileId, LinkTracker};
//!
//! let mut tracker = LinkTracker::new();
//! let id = FileId::new(1, 42);
//! assert!(tracker.first_sighting(Some(id)));
//! assert!(!tracker.first_sighting(Some(id)));
//! assert!(tracker.first_sighting(None));
//! ```

use std::collections::HashSet;
use std::fs::Metadata;

use serde::{Deserialize, Serialize};

/// Device and inode of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    /// Build an identity from raw device and inode numbers.
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Identity of the file `metadata` describes, where the platform has one.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::new(metadata.dev(), metadata.ino()))
    }

    /// Identity of the file `metadata` describes, where the platform has one.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Number of directory entries naming this file (1 where unknown).
#[cfg(unix)]
#[must_use]
pub fn link_count(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink()
}

/// Number of directory entries naming this file (1 where unknown).
#[cfg(not(unix))]
#[must_use]
pub fn link_count(_metadata: &Metadata) -> u64 {
    1
}

/// Remembers which files have been seen.
///
/// Not thread-safe; one tracker per group or per pass.
#[derive(Debug, Default)]
pub struct LinkTracker {
    seen: HashSet<FileId>,
}

impl LinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, returning whether it is new.
    ///
    /// A missing identity is always new: without one, paths cannot be
    /// proven to share data.
    pub fn first_sighting(&mut self, id: Option<FileId>) -> bool {
        id.map_or(true, |id| self.seen.insert(id))
    }

    /// Number of distinct identities recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
