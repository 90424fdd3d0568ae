//! Duplicate groups and digest aggregation.
//!
//! # Overview
//!
//! [`DigestAggregator`] is the single owner of the digest → files mapping
//! built during one scan. Hash workers never touch it; their results are
//! funneled to it one at a time. When the scan is done it is consumed into
//! a list of [`DuplicateGroup`]s.
//!
//! # Ordering
//!
//! Members of a group are ordered by discovery index (walk order), never by
//! the order in which hashes completed. Groups are ordered by the discovery
//! index of their first member. Both orders are therefore deterministic for
//! a given directory tree.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::DigestAggregator;
//! use dupsweep::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let mut aggregator = DigestAggregator::new();
//! aggregator.insert([1u8; 32], FileEntry::new(PathBuf::from("/b"), 3, 1));
//! aggregator.insert([1u8; 32], FileEntry::new(PathBuf::from("/a"), 3, 0));
//! aggregator.insert([2u8; 32], FileEntry::new(PathBuf::from("/c"), 5, 2));
//!
//! let groups = aggregator.into_groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].files[0].path, PathBuf::from("/a"));
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scanner::hardlink::LinkTracker;
use crate::scanner::{hash_to_hex, Digest, FileEntry};

/// Confirmed duplicate group of files.
///
/// Always holds two or more files, ordered by discovery index.
/// `files[0]` is the original kept by the keep-first policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content digest shared by every file
    pub hash: Digest,
    /// File size in bytes (identical content, identical size)
    pub size: u64,
    /// Files with this content, in discovery order
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// Files are sorted by discovery index.
    #[must_use]
    pub fn new(hash: Digest, mut files: Vec<FileEntry>) -> Self {
        files.sort_by_key(|f| f.index);
        let size = files.first().map_or(0, |f| f.size);
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The first-discovered file.
    #[must_use]
    pub fn original(&self) -> Option<&FileEntry> {
        self.files.first()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space freed by keeping one copy.
    ///
    /// Symlinks hold no data of their own, and a member sharing its inode
    /// with an earlier member (hardlink, or the target of a symlink) frees
    /// nothing when removed.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        let mut tracker = LinkTracker::new();
        let mut members = self.files.iter();
        if let Some(original) = members.next() {
            tracker.first_sighting(original.file_id);
        }
        let distinct = members
            .filter(|f| !f.is_symlink && tracker.first_sighting(f.file_id))
            .count();
        self.size * distinct as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as lowercase hexadecimal.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Paths of the files in this group, in discovery order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Accumulates digest → files for one scan.
#[derive(Debug, Default)]
pub struct DigestAggregator {
    by_digest: HashMap<Digest, Vec<FileEntry>>,
    files: usize,
}

impl DigestAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` has content `digest`.
    pub fn insert(&mut self, digest: Digest, file: FileEntry) {
        self.files += 1;
        self.by_digest.entry(digest).or_default().push(file);
    }

    /// Number of files recorded.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Number of distinct digests recorded.
    #[must_use]
    pub fn distinct_digests(&self) -> usize {
        self.by_digest.len()
    }

    /// Consume the aggregator, keeping only digests shared by 2+ files.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .by_digest
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(hash, files)| DuplicateGroup::new(hash, files))
            .collect();

        groups.sort_by_key(|g| g.files.first().map_or(usize::MAX, |f| f.index));

        for group in &groups {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                group.hash_hex(),
                group.len(),
                group.size
            );
        }

        groups
    }
}

/// Group `(digest, file)` pairs into duplicate groups.
#[must_use]
pub fn group_by_digest(items: impl IntoIterator<Item = (Digest, FileEntry)>) -> Vec<DuplicateGroup> {
    let mut aggregator = DigestAggregator::new();
    for (digest, file) in items {
        aggregator.insert(digest, file);
    }
    aggregator.into_groups()
}
