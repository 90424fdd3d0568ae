//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Walking a tree and hashing every file ([`DuplicateFinder`])
//! - Grouping files by content digest ([`DigestAggregator`])
//! - Duplicate group management ([`DuplicateGroup`])

pub mod finder;
pub mod groups;

pub use finder::{find_duplicates, DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_digest, DigestAggregator, DuplicateGroup};
